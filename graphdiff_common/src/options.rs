use crate::error::GraphDiffError;
use crate::types::Attribute;
use std::any::TypeId;
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};
use std::str::FromStr;

/// Flag set controlling what the engine compares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComparisonOptions(u32);

impl ComparisonOptions {
    pub const NONE: Self = Self(0);
    pub const COMPARE_PROPERTIES: Self = Self(1);
    pub const COMPARE_FIELDS: Self = Self(1 << 1);
    pub const COMPARE_COLLECTIONS: Self = Self(1 << 2);
    pub const DISABLE_IGNORE_ATTRIBUTES: Self = Self(1 << 3);
    pub const ALLOW_COMPARE_DIFFERENT_OBJECTS: Self = Self(1 << 4);
    pub const ALLOW_COLLECTIONS_OUT_OF_ORDER: Self = Self(1 << 5);
    pub const ALLOW_EQUALS_OVERRIDE: Self = Self(1 << 6);
    pub const TREAT_EMPTY_AND_NULL_COLLECTIONS_EQUAL: Self = Self(1 << 7);
    pub const INCLUDE_LIST: Self = Self(1 << 8);
    /// Explicit form of the default list mode; `INCLUDE_LIST` takes precedence
    pub const EXCLUDE_LIST: Self = Self(1 << 9);
    pub const INCLUDE_LIST_NO_INHERITANCE: Self = Self(1 << 10);

    pub const ALL: Self =
        Self(Self::COMPARE_PROPERTIES.0 | Self::COMPARE_FIELDS.0 | Self::COMPARE_COLLECTIONS.0);

    const NAMES: &'static [(&'static str, ComparisonOptions)] = &[
        ("compare-properties", Self::COMPARE_PROPERTIES),
        ("compare-fields", Self::COMPARE_FIELDS),
        ("compare-collections", Self::COMPARE_COLLECTIONS),
        ("disable-ignore-attributes", Self::DISABLE_IGNORE_ATTRIBUTES),
        ("allow-compare-different-objects", Self::ALLOW_COMPARE_DIFFERENT_OBJECTS),
        ("allow-collections-out-of-order", Self::ALLOW_COLLECTIONS_OUT_OF_ORDER),
        ("allow-equals-override", Self::ALLOW_EQUALS_OVERRIDE),
        (
            "treat-empty-and-null-collections-equal",
            Self::TREAT_EMPTY_AND_NULL_COLLECTIONS_EQUAL,
        ),
        ("include-list", Self::INCLUDE_LIST),
        ("exclude-list", Self::EXCLUDE_LIST),
        ("include-list-no-inheritance", Self::INCLUDE_LIST_NO_INHERITANCE),
    ];

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & 0x7ff)
    }

    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(&self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Look up a single flag by its kebab-case name
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('_', "-");
        if normalized == "all" {
            return Some(Self::ALL);
        }
        Self::NAMES
            .iter()
            .find(|(flag_name, _)| *flag_name == normalized)
            .map(|(_, flag)| *flag)
    }

    /// Kebab-case names of the set flags
    pub fn names(&self) -> Vec<&'static str> {
        Self::NAMES
            .iter()
            .filter(|(_, flag)| self.contains(*flag))
            .map(|(name, _)| *name)
            .collect()
    }

    /// Combine flag names into one set
    pub fn from_names<I, S>(names: I) -> Result<Self, GraphDiffError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names.into_iter().try_fold(Self::NONE, |acc, name| {
            let name = name.as_ref();
            Self::from_name(name)
                .map(|flag| acc | flag)
                .ok_or_else(|| GraphDiffError::Config(format!("Unknown comparison option: {}", name)))
        })
    }
}

impl Default for ComparisonOptions {
    fn default() -> Self {
        Self::ALL
    }
}

impl BitOr for ComparisonOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ComparisonOptions {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ComparisonOptions {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for ComparisonOptions {
    type Output = Self;

    fn not(self) -> Self {
        Self::from_bits_truncate(!self.0)
    }
}

impl FromStr for ComparisonOptions {
    type Err = GraphDiffError;

    /// Parse a comma or `|` separated list of flag names
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_names(s.split([',', '|']).filter(|part| !part.trim().is_empty()))
    }
}

impl fmt::Display for ComparisonOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        f.write_str(&self.names().join(" | "))
    }
}

/// Marker attribute that excludes a member or a type from comparison
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffIgnore;

/// One entry of the ignore-attribute list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreAttribute {
    Type(TypeId),
    Name(String),
}

impl IgnoreAttribute {
    pub fn of<T: 'static>() -> Self {
        IgnoreAttribute::Type(TypeId::of::<T>())
    }

    pub fn named(name: impl Into<String>) -> Self {
        IgnoreAttribute::Name(name.into())
    }

    pub fn matches(&self, attribute: &Attribute) -> bool {
        match self {
            IgnoreAttribute::Type(id) => attribute.type_id() == Some(*id),
            IgnoreAttribute::Name(name) => attribute.name() == name,
        }
    }
}

/// Extra settings passed alongside the comparison flags
#[derive(Debug, Clone)]
pub struct DiffOptions {
    pub attribute_ignore_list: Vec<IgnoreAttribute>,
}

impl DiffOptions {
    pub fn new(attribute_ignore_list: Vec<IgnoreAttribute>) -> Self {
        Self {
            attribute_ignore_list,
        }
    }

    pub fn with_ignore(mut self, attribute: IgnoreAttribute) -> Self {
        self.attribute_ignore_list.push(attribute);
        self
    }

    /// True when any of `attributes` is on the ignore list
    pub fn is_ignored(&self, attributes: &[Attribute]) -> bool {
        attributes
            .iter()
            .any(|attr| self.attribute_ignore_list.iter().any(|ignore| ignore.matches(attr)))
    }
}

impl Default for DiffOptions {
    /// Process-wide defaults; see [`crate::DiffDefaults`]
    fn default() -> Self {
        Self {
            attribute_ignore_list: crate::defaults::DiffDefaults::get().ignore_attributes.clone(),
        }
    }
}
