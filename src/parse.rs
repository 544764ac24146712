//! Parsing of raw capability content
//!
//! Documents arrive as either YAML or JSON strings. The serialization format
//! is sniffed from the first non-whitespace character (`{` or `[` means
//! JSON), matching how the registry historically stored both formats side by
//! side.

use serde_json::Value;

use crate::error::{RegistryError, Result};

/// Serialization format of a raw document string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentFormat {
    Json,
    #[default]
    Yaml,
}

impl DocumentFormat {
    /// Sniff the format from content
    pub fn detect(content: &str) -> Self {
        match content.trim_start().chars().next() {
            Some('{') | Some('[') => Self::Json,
            _ => Self::Yaml,
        }
    }
}

/// Parse a raw YAML or JSON string into a JSON value.
///
/// The format is auto-detected; neither parser succeeding is a fatal
/// [`RegistryError::Parse`].
pub fn parse_document(content: &str) -> Result<Value> {
    match DocumentFormat::detect(content) {
        DocumentFormat::Json => serde_json::from_str(content)
            .map_err(|e| RegistryError::Parse(format!("invalid JSON: {e}"))),
        DocumentFormat::Yaml => serde_yaml::from_str(content)
            .map_err(|e| RegistryError::Parse(format!("invalid YAML: {e}"))),
    }
}

/// Serialize a document value back out in the requested format.
pub fn serialize_document(value: &Value, format: DocumentFormat) -> Result<String> {
    match format {
        DocumentFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        DocumentFormat::Yaml => Ok(serde_yaml::to_string(value)?),
    }
}
