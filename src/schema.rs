//! Validation schema definitions
//!
//! A [`ValidationSchema`] is the JSON-Schema-like definition a document is
//! checked against. One schema is registered per protocol format version;
//! schema files are plain JSON and may carry extra metadata keys (`title`,
//! `version`, `$schema`), which are ignored here and handled by the registry
//! loader.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A structural validation schema (JSON-Schema subset).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationSchema {
    /// Expected runtime type (`object`, `array`, `string`, `number`,
    /// `integer`, `boolean`, `null`)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, ValidationSchema>,
    /// Regex a string value must match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    /// Schema applied to each element of an array value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<ValidationSchema>>,
    /// `Some(false)` turns unknown document keys into warnings
    #[serde(
        rename = "additionalProperties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<bool>,
}

impl ValidationSchema {
    /// An object schema with the given required field names
    pub fn object(required: &[&str]) -> Self {
        Self {
            schema_type: Some("object".to_string()),
            required: required.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    /// A schema expecting a specific primitive type
    pub fn typed(schema_type: &str) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            ..Self::default()
        }
    }

    /// Add a property schema
    pub fn property(mut self, name: &str, schema: ValidationSchema) -> Self {
        self.properties.insert(name.to_string(), schema);
        self
    }

    /// Set the string pattern constraint
    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(pattern.to_string());
        self
    }
}

/// The minimal baseline schema for format version `1.0.0`.
///
/// Used as a last-resort fallback when the embedded schema files cannot be
/// read; the registry guarantees some `1.0.0` schema is always registered.
pub fn baseline_schema() -> ValidationSchema {
    ValidationSchema::object(&["enact", "id", "description", "version", "type", "authors"])
        .property(
            "enact",
            ValidationSchema::typed("string").with_pattern(r"^\d+\.\d+\.\d+$"),
        )
        .property("id", ValidationSchema::typed("string"))
        .property("description", ValidationSchema::typed("string"))
        .property(
            "version",
            ValidationSchema::typed("string").with_pattern(r"^\d+\.\d+\.\d+$"),
        )
        .property("type", ValidationSchema::typed("string"))
        .property("authors", {
            let mut authors = ValidationSchema::typed("array");
            authors.items = Some(Box::new(
                ValidationSchema::object(&["name"])
                    .property("name", ValidationSchema::typed("string"))
                    .property("email", ValidationSchema::typed("string"))
                    .property("url", ValidationSchema::typed("string")),
            ));
            authors
        })
}
