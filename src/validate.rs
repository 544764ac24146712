//! Structural document validation
//!
//! Checks a document against a [`ValidationSchema`], recursing into nested
//! objects and arrays. Validation is informational by default: missing
//! required fields become warnings so that ingestion stays permissive toward
//! schema drift, and only strict mode (explicit opt-in) promotes them to
//! errors. Type, pattern, and enum violations are always errors: a document
//! that fails them cannot be used safely regardless of strictness.
//!
//! Each recursion level is a pure function returning its own error and
//! warning lists; callers concatenate them with path prefixes (`prop.`,
//! `prop[i].`).

use regex::Regex;
use serde_json::Value;

use crate::schema::ValidationSchema;

/// Outcome of validating one document against one schema
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    fn from_parts(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

/// Validate a document against a schema.
pub fn validate(document: &Value, schema: &ValidationSchema, strict: bool) -> ValidationReport {
    let (errors, warnings) = check_value(document, schema, strict);
    ValidationReport::from_parts(errors, warnings)
}

/// Validate one value against one schema level, returning relative messages.
fn check_value(value: &Value, schema: &ValidationSchema, strict: bool) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if let Some(expected) = &schema.schema_type {
        if !matches_type(value, expected) {
            errors.push(format!("invalid type: expected {expected}"));
            return (errors, warnings);
        }
    }

    if let (Some(pattern), Some(text)) = (&schema.pattern, value.as_str()) {
        match Regex::new(pattern) {
            Ok(re) => {
                if !re.is_match(text) {
                    errors.push(format!("does not match pattern {pattern}"));
                }
            }
            // A broken pattern is a schema authoring problem, not a
            // document problem.
            Err(_) => warnings.push(format!("unusable pattern in schema: {pattern}")),
        }
    }

    if let Some(allowed) = &schema.enum_values {
        if !allowed.contains(value) {
            let list = allowed
                .iter()
                .map(render_enum_value)
                .collect::<Vec<_>>()
                .join(", ");
            errors.push(format!("not one of allowed values: {list}"));
        }
    }

    if let Some(obj) = value.as_object() {
        for field in &schema.required {
            if !obj.contains_key(field) {
                let msg = format!("missing required field: {field}");
                if strict {
                    errors.push(msg);
                } else {
                    warnings.push(msg);
                }
            }
        }

        for (prop, prop_schema) in &schema.properties {
            if let Some(prop_value) = obj.get(prop) {
                let (nested_errors, nested_warnings) = check_value(prop_value, prop_schema, strict);
                errors.extend(nested_errors.into_iter().map(|m| prefixed(prop, m)));
                warnings.extend(nested_warnings.into_iter().map(|m| prefixed(prop, m)));
            }
        }

        // Extensibility escape hatch: vendor keys prefixed `x-` are exempt
        if schema.additional_properties == Some(false) {
            for key in obj.keys() {
                if !schema.properties.contains_key(key) && !key.starts_with("x-") {
                    warnings.push(format!("unknown property: {key}"));
                }
            }
        }
    }

    if let (Some(item_schema), Some(elements)) = (&schema.items, value.as_array()) {
        for (index, element) in elements.iter().enumerate() {
            let (item_errors, item_warnings) = check_value(element, item_schema, strict);
            errors.extend(item_errors.into_iter().map(|m| format!("[{index}].{m}")));
            warnings.extend(item_warnings.into_iter().map(|m| format!("[{index}].{m}")));
        }
    }

    (errors, warnings)
}

/// Join a property name onto a nested message. Array-element messages
/// already start with `[i]`, which attaches without a dot so paths read
/// `steps[0].id` rather than `steps.[0].id`.
fn prefixed(prop: &str, message: String) -> String {
    if message.starts_with('[') {
        format!("{prop}{message}")
    } else {
        format!("{prop}.{message}")
    }
}

/// Structural runtime type check. Unknown type names are treated as valid.
fn matches_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" | "integer" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn render_enum_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
