use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphDiffError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Type mismatch at '{path}': left is {left}, right is {right}")]
    TypeMismatch {
        path: String,
        left: String,
        right: String,
    },

    #[error("Failed to read field '{path}': {reason}")]
    FieldAccess { path: String, reason: String },

    #[error("Unsupported selector expression: {0}")]
    UnsupportedExpression(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Document error: {0}")]
    Document(String),
}

pub type Result<T> = std::result::Result<T, GraphDiffError>;
