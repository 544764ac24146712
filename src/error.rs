//! Error types for the capability registry

use thiserror::Error;

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Capability registry errors
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Failed to parse document: {0}")]
    Parse(String),

    #[error("Document failed strict validation: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Cannot normalize document: {0}")]
    Normalization(String),

    #[error("Capability not found: {0}")]
    NotFound(String),

    #[error("Invalid format version: {0}")]
    InvalidVersion(String),

    #[error("Capability id is not storable: {0}")]
    InvalidId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
