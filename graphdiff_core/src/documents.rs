use graphdiff_common::{GraphDiffError, ObjectRef, Result, TypeDescriptor, TypeInfo, Value};
use serde_json::Value as JsonValue;
use serde_yml::Value as YamlValue;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};
use toml::Value as TomlValue;
use tracing::debug;

/// Type name of every converted document object
pub const OBJECT_TYPE: &str = "object";

const ARRAY_TYPE: &str = "array";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    Toml,
}

impl DocumentFormat {
    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

impl FromStr for DocumentFormat {
    type Err = GraphDiffError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "toml" => Ok(Self::Toml),
            other => Err(GraphDiffError::Document(format!(
                "Unknown document format: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Toml => "toml",
        };
        f.write_str(name)
    }
}

fn object_descriptor() -> Arc<TypeDescriptor> {
    static DESCRIPTOR: OnceLock<Arc<TypeDescriptor>> = OnceLock::new();
    DESCRIPTOR
        .get_or_init(|| TypeDescriptor::open(OBJECT_TYPE))
        .clone()
}

fn array(items: Vec<Value>) -> Value {
    Value::collection(TypeInfo::collection(ARRAY_TYPE), items)
}

fn object<I>(entries: I) -> Value
where
    I: IntoIterator<Item = (String, Value)>,
{
    let object = ObjectRef::new(object_descriptor());
    for (key, value) in entries {
        object.set(key, value);
    }
    Value::Object(object)
}

pub fn from_json(value: &JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::I64(i)
            } else if let Some(u) = n.as_u64() {
                Value::U64(u)
            } else {
                Value::F64(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        JsonValue::String(s) => Value::String(s.clone()),
        JsonValue::Array(items) => array(items.iter().map(from_json).collect()),
        JsonValue::Object(map) => object(map.iter().map(|(k, v)| (k.clone(), from_json(v)))),
    }
}

pub fn from_yaml(value: &YamlValue) -> Value {
    match value {
        YamlValue::Null => Value::Null,
        YamlValue::Bool(b) => Value::Bool(*b),
        YamlValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::I64(i)
            } else if let Some(u) = n.as_u64() {
                Value::U64(u)
            } else {
                Value::F64(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        YamlValue::String(s) => Value::String(s.clone()),
        YamlValue::Sequence(items) => array(items.iter().map(from_yaml).collect()),
        YamlValue::Mapping(map) => object(map.iter().map(|(k, v)| (yaml_key(k), from_yaml(v)))),
        YamlValue::Tagged(tagged) => from_yaml(&tagged.value),
    }
}

/// Mapping keys become member names; non-string keys use their scalar text
fn yaml_key(key: &YamlValue) -> String {
    match key {
        YamlValue::String(s) => s.clone(),
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Number(n) => n.to_string(),
        YamlValue::Null => "null".to_string(),
        other => serde_yml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

pub fn from_toml(value: &TomlValue) -> Value {
    match value {
        TomlValue::String(s) => Value::String(s.clone()),
        TomlValue::Integer(i) => Value::I64(*i),
        TomlValue::Float(f) => Value::F64(*f),
        TomlValue::Boolean(b) => Value::Bool(*b),
        TomlValue::Datetime(dt) => Value::String(dt.to_string()),
        TomlValue::Array(items) => array(items.iter().map(from_toml).collect()),
        TomlValue::Table(table) => {
            object(table.iter().map(|(k, v)| (k.clone(), from_toml(v))))
        }
    }
}

/// Parse document text into a comparable value
pub fn parse_document(text: &str, format: DocumentFormat) -> Result<Value> {
    let value = match format {
        DocumentFormat::Json => {
            let json: JsonValue = serde_json::from_str(text)
                .map_err(|e| GraphDiffError::Document(format!("Failed to parse JSON: {}", e)))?;
            from_json(&json)
        }
        DocumentFormat::Yaml => {
            let yaml: YamlValue = serde_yml::from_str(text)
                .map_err(|e| GraphDiffError::Document(format!("Failed to parse YAML: {}", e)))?;
            from_yaml(&yaml)
        }
        DocumentFormat::Toml => {
            let table: toml::Table = text
                .parse()
                .map_err(|e| GraphDiffError::Document(format!("Failed to parse TOML: {}", e)))?;
            from_toml(&TomlValue::Table(table))
        }
    };
    Ok(value)
}

/// Read and parse a document. Without an explicit format the file extension decides.
pub fn load_document(path: &Path, format: Option<DocumentFormat>) -> Result<Value> {
    let format = match format.or_else(|| DocumentFormat::from_path(path)) {
        Some(format) => format,
        None => {
            return Err(GraphDiffError::Document(format!(
                "Cannot determine document format of {}",
                path.display()
            )))
        }
    };
    debug!("Loading {} as {}", path.display(), format);
    let text = std::fs::read_to_string(path)?;
    parse_document(&text, format)
}
