//! Field-level shape canonicalization
//!
//! The registry has ingested documents from several protocol eras, and the
//! same logical field shows up in incompatible shapes: inputs/outputs as a
//! flat name→field map or as a wrapped JSON-Schema object, flow steps keyed
//! `task`/`with` or `capability`/`inputs`, env vars as an array of named
//! entries or as a record. Each normalizer here detects the shape explicitly
//! and converts to the single canonical form. All normalizers are total:
//! unrecognizable input degrades to the canonical empty value, never to an
//! error.

use serde_json::{Map, Value};

use crate::document::{
    Author, EnvResources, Environment, Flow, FlowStep, JsonSchemaField, SchemaObject, Task,
};

/// Detected shape of a raw inputs/outputs value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawSchemaShape {
    /// Already `{type: "object", properties: {...}, ...}`
    Canonical,
    /// Legacy convention: the value itself is the properties map
    FlatMap,
    /// Missing, null, or not an object at all
    Absent,
}

/// Classify a raw inputs/outputs value.
pub fn detect_schema_shape(raw: Option<&Value>) -> RawSchemaShape {
    match raw.and_then(Value::as_object) {
        None => RawSchemaShape::Absent,
        Some(obj) => {
            let wrapped = obj.get("type").and_then(Value::as_str) == Some("object")
                && obj.get("properties").map(Value::is_object).unwrap_or(false);
            if wrapped {
                RawSchemaShape::Canonical
            } else {
                RawSchemaShape::FlatMap
            }
        }
    }
}

/// Normalize an inputs/outputs value into the canonical wrapped shape.
///
/// `required` entries that do not name a property are dropped to keep the
/// canonical invariant (every required name exists in `properties`).
pub fn normalize_schema_object(raw: Option<&Value>) -> SchemaObject {
    match detect_schema_shape(raw) {
        RawSchemaShape::Absent => SchemaObject::empty(),
        RawSchemaShape::Canonical => {
            // raw is an object here by construction of the shape check
            let obj = raw.and_then(Value::as_object).cloned().unwrap_or_default();
            let mut out = SchemaObject::empty();
            if let Some(props) = obj.get("properties").and_then(Value::as_object) {
                for (name, field) in props {
                    out.properties.insert(name.clone(), normalize_field(field));
                }
            }
            if let Some(required) = obj.get("required").and_then(Value::as_array) {
                out.required = required
                    .iter()
                    .filter_map(Value::as_str)
                    .filter(|name| out.properties.contains_key(*name))
                    .map(String::from)
                    .collect();
            }
            out
        }
        RawSchemaShape::FlatMap => {
            let mut out = SchemaObject::empty();
            if let Some(props) = raw.and_then(Value::as_object) {
                for (name, field) in props {
                    out.properties.insert(name.clone(), normalize_field(field));
                }
            }
            out
        }
    }
}

/// Normalize one property descriptor. Malformed descriptors degrade to the
/// empty field rather than failing.
pub fn normalize_field(raw: &Value) -> JsonSchemaField {
    if raw.is_object() {
        serde_json::from_value(raw.clone()).unwrap_or_default()
    } else {
        JsonSchemaField::default()
    }
}

/// Normalize raw flow steps into the canonical `capability`/`inputs` keying.
///
/// Step order is preserved exactly; non-object entries are skipped.
pub fn normalize_flow_steps(raw_steps: Option<&Value>) -> Vec<FlowStep> {
    let Some(steps) = raw_steps.and_then(Value::as_array) else {
        return Vec::new();
    };

    steps
        .iter()
        .filter_map(Value::as_object)
        .map(normalize_flow_step)
        .collect()
}

fn normalize_flow_step(step: &Map<String, Value>) -> FlowStep {
    let legacy_task = step.get("task").and_then(Value::as_str);
    let capability = step.get("capability").and_then(Value::as_str);

    let (capability, inputs) = match (capability, legacy_task) {
        // Legacy keying: `task` names the target, parameters live in `with`
        (None, Some(task)) => {
            let inputs = step
                .get("with")
                .or_else(|| step.get("inputs"))
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            (task.to_string(), inputs)
        }
        _ => {
            let inputs = step
                .get("inputs")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            (capability.unwrap_or("").to_string(), inputs)
        }
    };

    let dependencies = step
        .get("dependencies")
        .and_then(Value::as_array)
        .map(|deps| {
            deps.iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    FlowStep {
        capability,
        inputs,
        dependencies,
    }
}

/// Extract the full flow from a raw document value.
pub fn normalize_flow(raw_flow: Option<&Value>) -> Flow {
    Flow {
        steps: normalize_flow_steps(raw_flow.and_then(|f| f.get("steps"))),
    }
}

/// Normalize the environment section, folding the legacy array-of-entries
/// vars shape (`[{name, description, schema}]`) into the canonical record.
pub fn normalize_env(raw: Option<&Value>) -> Option<Environment> {
    let env = raw?.as_object()?;
    let mut out = Environment::default();

    match env.get("vars") {
        Some(Value::Array(entries)) => {
            for entry in entries.iter().filter_map(Value::as_object) {
                let Some(name) = entry.get("name").and_then(Value::as_str) else {
                    continue;
                };
                let schema = entry.get("schema").and_then(Value::as_object);
                let mut field = JsonSchemaField::typed(
                    schema
                        .and_then(|s| s.get("type"))
                        .and_then(Value::as_str)
                        .unwrap_or("string"),
                );
                field.description = Some(
                    entry
                        .get("description")
                        .and_then(Value::as_str)
                        .unwrap_or("")
                        .to_string(),
                );
                field.default = schema.and_then(|s| s.get("default")).cloned();
                out.vars.insert(name.to_string(), field);
            }
        }
        Some(Value::Object(record)) => {
            for (name, field) in record {
                out.vars.insert(name.clone(), normalize_field(field));
            }
        }
        _ => {}
    }

    if let Some(resources) = env.get("resources") {
        out.resources = Some(EnvResources {
            memory: resources
                .get("memory")
                .and_then(Value::as_str)
                .map(String::from),
            timeout: resources
                .get("timeout")
                .and_then(Value::as_str)
                .map(String::from),
        });
    }

    Some(out)
}

/// Normalize the authors list. Bare strings are accepted as author names;
/// entries without a usable name are dropped.
pub fn normalize_authors(raw: Option<&Value>) -> Vec<Author> {
    let Some(authors) = raw.and_then(Value::as_array) else {
        return Vec::new();
    };

    authors
        .iter()
        .filter_map(|entry| match entry {
            Value::String(name) => Some(Author {
                name: name.clone(),
                email: None,
                url: None,
            }),
            Value::Object(obj) => {
                let name = obj.get("name").and_then(Value::as_str)?;
                Some(Author {
                    name: name.to_string(),
                    email: obj.get("email").and_then(Value::as_str).map(String::from),
                    url: obj.get("url").and_then(Value::as_str).map(String::from),
                })
            }
            _ => None,
        })
        .collect()
}

/// Normalize the tasks list. Non-object entries are skipped; object entries
/// deserialize with typed defaults.
pub fn normalize_tasks(raw: Option<&Value>) -> Vec<Task> {
    let Some(tasks) = raw.and_then(Value::as_array) else {
        return Vec::new();
    };

    tasks
        .iter()
        .filter(|t| t.is_object())
        .map(|t| serde_json::from_value(t.clone()).unwrap_or_default())
        .collect()
}
