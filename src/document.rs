//! Canonical capability document model
//!
//! Every document ingested by the registry, whatever its source shape or
//! protocol era, is normalized into these types. The canonical form always
//! keys flow steps by `capability`, wraps inputs/outputs in a JSON-Schema
//! object shape, and records env vars as a map.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// The version-independent wrapper around a protocol document.
///
/// This is the unit exchanged with the storage layer and returned to API
/// callers. `name` defaults to `id` when the source provides none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityWrapper {
    pub id: String,
    pub name: String,
    pub description: String,
    pub version: String,
    #[serde(rename = "isAtomic")]
    pub is_atomic: bool,
    #[serde(rename = "protocolDetails")]
    pub protocol_details: EnactDocument,
}

/// The protocol-versioned payload of a capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnactDocument {
    /// Protocol format version (`\d+.\d+.\d+`), always present after
    /// normalization
    pub enact: String,
    pub id: String,
    pub description: String,
    pub version: String,
    #[serde(rename = "type")]
    pub capability_type: CapabilityType,
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(default)]
    pub inputs: SchemaObject,
    #[serde(default)]
    pub outputs: SchemaObject,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub flow: Flow,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<Environment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

/// Whether a capability executes one task directly or orchestrates a flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityType {
    #[default]
    Atomic,
    Composite,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Canonical inputs/outputs shape: always an object schema with explicit
/// properties and required lists, regardless of what the source supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaObject {
    #[serde(rename = "type")]
    pub object_type: String,
    #[serde(default)]
    pub properties: BTreeMap<String, JsonSchemaField>,
    #[serde(default)]
    pub required: Vec<String>,
}

impl Default for SchemaObject {
    fn default() -> Self {
        Self {
            object_type: "object".to_string(),
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }
}

impl SchemaObject {
    /// Empty canonical shape (`{type: "object", properties: {}, required: []}`)
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.required.is_empty()
    }
}

/// A recursive JSON-Schema subset describing one input, output, or env var.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JsonSchemaField {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<serde_json::Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<serde_json::Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, JsonSchemaField>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<JsonSchemaField>>,
    #[serde(
        rename = "additionalProperties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<Value>,
}

impl JsonSchemaField {
    /// A field with just a type, the most common shape in the wild
    pub fn typed(field_type: impl Into<String>) -> Self {
        Self {
            field_type: Some(field_type.into()),
            ..Self::default()
        }
    }
}

/// An executable task of an atomic capability.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Value>,
}

/// Ordered execution flow of a capability. Step order is significant and is
/// never reordered or deduplicated by normalization.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Flow {
    #[serde(default)]
    pub steps: Vec<FlowStep>,
}

/// One ordered unit of execution. The canonical key is `capability`; legacy
/// documents keyed this `task` and passed parameters under `with`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FlowStep {
    #[serde(default)]
    pub capability: String,
    #[serde(default)]
    pub inputs: serde_json::Map<String, Value>,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl FlowStep {
    pub fn new(capability: impl Into<String>) -> Self {
        Self {
            capability: capability.into(),
            inputs: serde_json::Map::new(),
            dependencies: Vec::new(),
        }
    }
}

/// Environment configuration for a capability.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Environment {
    #[serde(default)]
    pub vars: BTreeMap<String, JsonSchemaField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<EnvResources>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EnvResources {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}
