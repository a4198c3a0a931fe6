use crate::options::ComparisonOptions;
use crate::GraphDiffError;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const CONFIG_FILE_NAME: &str = "graphdiff.toml";

/// Contents of `graphdiff.toml`
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DiffConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    /// Attribute names ignored in addition to the built-in ones
    #[serde(default)]
    pub ignore_attributes: Vec<String>,
    /// Comparison flag names; empty means the default set
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub include: Vec<String>,
}

impl DiffConfig {
    pub fn comparison_options(&self) -> Result<ComparisonOptions, GraphDiffError> {
        if self.options.is_empty() {
            return Ok(ComparisonOptions::default());
        }
        ComparisonOptions::from_names(&self.options)
    }
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: DiffConfig,
    pub path: PathBuf,
    pub exists: bool,
}

/// Load the config from `explicit`, or from the per-user config directory
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig, GraphDiffError> {
    let path = resolve_config_path(explicit)?;
    let exists = path.exists();

    let config = if exists {
        debug!("Loading config from {}", path.display());
        let data = fs::read_to_string(&path)?;
        toml::from_str(&data).map_err(|e| GraphDiffError::Serialization(e.to_string()))?
    } else {
        DiffConfig::default()
    };

    // Reject unknown flag names at load time rather than at first use
    config.comparison_options()?;

    Ok(LoadedConfig {
        config,
        path,
        exists,
    })
}

pub fn ensure_config(explicit: Option<&Path>) -> Result<LoadedConfig, GraphDiffError> {
    let loaded = load_config(explicit)?;
    if !loaded.exists {
        save_config(&loaded.path, &loaded.config)?;
    }
    Ok(loaded)
}

pub fn save_config(path: &Path, config: &DiffConfig) -> Result<(), GraphDiffError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let data = toml::to_string_pretty(config)
        .map_err(|e| GraphDiffError::Serialization(e.to_string()))?;
    fs::write(path, data)?;
    debug!("Saved config to {}", path.display());
    Ok(())
}

fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf, GraphDiffError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    let dirs = ProjectDirs::from("", "graphdiff", "graphdiff").ok_or_else(|| {
        GraphDiffError::Config("Unable to determine config directory".to_string())
    })?;
    Ok(dirs.config_dir().join(CONFIG_FILE_NAME))
}
