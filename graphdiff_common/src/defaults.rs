use crate::config::DiffConfig;
use crate::error::{GraphDiffError, Result};
use crate::options::{DiffIgnore, IgnoreAttribute};
use std::sync::OnceLock;

static DEFAULTS: OnceLock<DiffDefaults> = OnceLock::new();

/// Process-wide defaults. Read-only once the first comparison has asked for them.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffDefaults {
    /// `None` or `Some(0)` means unlimited
    pub max_depth: Option<usize>,
    pub ignore_attributes: Vec<IgnoreAttribute>,
}

impl DiffDefaults {
    pub fn builtin() -> Self {
        Self {
            max_depth: None,
            ignore_attributes: vec![
                IgnoreAttribute::of::<DiffIgnore>(),
                IgnoreAttribute::named("NonSerialized"),
                IgnoreAttribute::named("JsonIgnore"),
                IgnoreAttribute::named("IgnoreDataMember"),
            ],
        }
    }

    /// Built-in defaults extended by a loaded config file
    pub fn from_config(config: &DiffConfig) -> Self {
        let mut defaults = Self::builtin();
        defaults.max_depth = config.max_depth;
        for name in &config.ignore_attributes {
            let entry = IgnoreAttribute::named(name.clone());
            if !defaults.ignore_attributes.contains(&entry) {
                defaults.ignore_attributes.push(entry);
            }
        }
        defaults
    }

    /// Replace the built-in defaults. Fails once they are in use.
    pub fn install(self) -> Result<()> {
        DEFAULTS.set(self).map_err(|_| {
            GraphDiffError::Config("diff defaults are already initialized".to_string())
        })
    }

    pub fn get() -> &'static DiffDefaults {
        DEFAULTS.get_or_init(Self::builtin)
    }
}
