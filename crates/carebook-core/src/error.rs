use thiserror::Error;

/// Top-level error type for Carebook.
///
/// Subsystem crates define their own error types and convert into this one
/// where they cross a crate boundary, so `?` works across the workspace.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CarebookError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Collaborator error: {0}")]
    Service(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for CarebookError {
    fn from(err: toml::de::Error) -> Self {
        CarebookError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for CarebookError {
    fn from(err: toml::ser::Error) -> Self {
        CarebookError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for CarebookError {
    fn from(err: serde_json::Error) -> Self {
        CarebookError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Carebook operations.
pub type Result<T> = std::result::Result<T, CarebookError>;
