use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building type metadata or composing a document.
///
/// Resolution anomalies inside the introspection engine are never reported through this
/// type; they are logged and replaced by a conservative schema instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error in {}: {message}", file.display())]
    Parse { file: PathBuf, message: String },

    #[error("invalid type expression `{expr}`: {message}")]
    InvalidTypeExpression { expr: String, message: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("type `{0}` is registered more than once")]
    DuplicateType(String),

    #[error("invalid constraint on {target}: {message}")]
    InvalidConstraint { target: String, message: String },

    #[error("invalid operation manifest: {0}")]
    Manifest(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    pub fn invalid_constraint<T: ToString, M: ToString>(target: T, message: M) -> Self {
        Self::InvalidConstraint {
            target: target.to_string(),
            message: message.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(format!("JSON: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Serialization(format!("YAML: {}", err))
    }
}
