//! Capability normalization orchestrator
//!
//! Takes a raw parsed document of unknown, possibly malformed shape and
//! produces one structurally complete [`CapabilityWrapper`]. Input may be
//! wrapper-shaped (carrying `protocolDetails`) or a bare protocol document;
//! both are accepted. Missing optional data never fails: every gap is filled
//! with a typed default, because the registry must ingest documents from
//! several protocol eras without rejecting them. The only failure is input
//! that is not an object at all.
//!
//! Normalization is idempotent: feeding a serialized wrapper back through
//! produces the identical wrapper.

use serde_json::Value;

use crate::document::{CapabilityType, CapabilityWrapper, EnactDocument, FlowStep};
use crate::error::{RegistryError, Result};
use crate::normalize;
use crate::transform;
use crate::version::FormatVersion;

/// Normalize a raw document into the canonical wrapper.
///
/// When `target_version` is supplied and differs from the document's source
/// version, the version transform is composed in and the output is stamped
/// with the target. The wrapper itself is always canonical-shaped; a
/// downgrade's legacy step keying only materializes at export time.
pub fn normalize(raw: &Value, target_version: Option<&FormatVersion>) -> Result<CapabilityWrapper> {
    let root = raw.as_object().ok_or_else(|| {
        RegistryError::Normalization(format!(
            "document must be an object, got {}",
            value_kind(raw)
        ))
    })?;

    let source_version = detect_source_version(raw);

    // Documents may or may not be wrapper-shaped on input
    let details_value = match root.get("protocolDetails") {
        Some(details) if details.is_object() => details.clone(),
        _ => raw.clone(),
    };

    let (details_value, enact) = match target_version {
        Some(target) if *target != source_version => (
            transform::transform(&details_value, &source_version, target),
            target.clone(),
        ),
        _ => (details_value, source_version),
    };
    let details = &details_value;

    let id = string_field(root, details, "id");
    let description = string_field(root, details, "description");
    let version = {
        let v = string_field(root, details, "version");
        if v.is_empty() {
            "1.0.0".to_string()
        } else {
            v
        }
    };
    // Display name falls back to the id
    let name = root
        .get("name")
        .or_else(|| details.get("name"))
        .and_then(Value::as_str)
        .map(String::from)
        .unwrap_or_else(|| id.clone());

    let tasks = normalize::normalize_tasks(details.get("tasks"));
    let mut flow = normalize::normalize_flow(details.get("flow"));

    // A capability is atomic exactly when it has tasks to execute directly
    let is_atomic = !tasks.is_empty();
    let capability_type = match details.get("type").and_then(Value::as_str) {
        Some("composite") => CapabilityType::Composite,
        Some(_) => CapabilityType::Atomic,
        None if is_atomic => CapabilityType::Atomic,
        None => CapabilityType::Composite,
    };

    // Atomic invariant: the flow is a single step referencing the one task.
    // Sources that omit the flow get it synthesized.
    if is_atomic && flow.steps.is_empty() {
        flow.steps.push(FlowStep::new(tasks[0].id.clone()));
    }

    let protocol_details = EnactDocument {
        enact: enact.version_string(),
        id: id.clone(),
        description: description.clone(),
        version: version.clone(),
        capability_type,
        authors: normalize::normalize_authors(details.get("authors")),
        inputs: normalize::normalize_schema_object(details.get("inputs")),
        outputs: normalize::normalize_schema_object(details.get("outputs")),
        tasks,
        flow,
        env: normalize::normalize_env(details.get("env")),
        imports: details
            .get("imports")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
        dependencies: details
            .get("dependencies")
            .filter(|d| !d.is_null())
            .cloned(),
        doc: details.get("doc").and_then(Value::as_str).map(String::from),
    };

    Ok(CapabilityWrapper {
        id,
        name,
        description,
        version,
        is_atomic,
        protocol_details,
    })
}

/// Source format version: top-level `enact`, then the wrapped document's,
/// then the baseline. Unparseable version strings also fall back to the
/// baseline rather than failing.
fn detect_source_version(raw: &Value) -> FormatVersion {
    raw.get("enact")
        .or_else(|| raw.get("protocolDetails").and_then(|d| d.get("enact")))
        .and_then(Value::as_str)
        .and_then(|s| FormatVersion::parse(s).ok())
        .unwrap_or_default()
}

fn string_field(root: &serde_json::Map<String, Value>, details: &Value, key: &str) -> String {
    root.get(key)
        .or_else(|| details.get(key))
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
