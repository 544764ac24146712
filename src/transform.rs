//! Version-pair document transformation
//!
//! Migrates a raw document's shape between protocol format versions. The
//! input is never mutated: callers may hold the original for logging or
//! rollback, so every transform works on a deep clone.
//!
//! Direction is chosen by a proper 3-way semver compare. A version pair with
//! no registered migration falls through as an identity transform with only
//! the `enact` stamp updated: the registry must stay usable even for format
//! versions it has no explicit migration for.

use serde_json::Value;
use tracing::debug;

use crate::version::FormatVersion;

/// Direction of a cross-version transform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Upgrade,
    Downgrade,
}

/// A structural migration between two major format generations.
struct Migration {
    from_major: u64,
    to_major: u64,
    apply: fn(&mut Value),
}

/// Known migrations, one per direction across the 1.x/2.x boundary.
const MIGRATIONS: &[Migration] = &[
    Migration {
        from_major: 1,
        to_major: 2,
        apply: steps_task_to_capability,
    },
    Migration {
        from_major: 2,
        to_major: 1,
        apply: steps_capability_to_task,
    },
];

/// Transform a document from one format version to another.
///
/// Identity when the versions are equal; otherwise clones, applies the
/// migration registered for the version pair (if any), and stamps
/// `enact = to`.
pub fn transform(document: &Value, from: &FormatVersion, to: &FormatVersion) -> Value {
    if from == to {
        return document.clone();
    }

    let mut result = document.clone();

    // The compare fixes the historical defect where both transform branches
    // guarded on the same condition, leaving one unreachable.
    let direction = if from < to {
        Direction::Upgrade
    } else {
        Direction::Downgrade
    };

    match MIGRATIONS
        .iter()
        .find(|m| m.from_major == from.major() && m.to_major == to.major())
    {
        Some(migration) => (migration.apply)(&mut result),
        None => debug!("No migration from {from} to {to} ({direction:?}), stamping only"),
    }

    if let Some(obj) = result.as_object_mut() {
        obj.insert("enact".to_string(), Value::String(to.version_string()));
    }

    result
}

/// Forward rename: `task` → `capability`, `with` → `inputs` in flow steps.
fn steps_task_to_capability(document: &mut Value) {
    for step in flow_steps_mut(document) {
        let Some(obj) = step.as_object_mut() else {
            continue;
        };
        // Strict key renames only. Defaulting absent inputs is the field
        // normalizer's job; injecting defaults here would break the
        // round-trip inverse property.
        if obj.contains_key("task") && !obj.contains_key("capability") {
            if let Some(task) = obj.remove("task") {
                obj.insert("capability".to_string(), task);
            }
            if let Some(with) = obj.remove("with") {
                obj.entry("inputs").or_insert(with);
            }
        }
    }
}

/// Backward rename: `capability` → `task`, `inputs` → `with` in flow steps.
fn steps_capability_to_task(document: &mut Value) {
    for step in flow_steps_mut(document) {
        let Some(obj) = step.as_object_mut() else {
            continue;
        };
        if obj.contains_key("capability") && !obj.contains_key("task") {
            if let Some(capability) = obj.remove("capability") {
                obj.insert("task".to_string(), capability);
            }
            if let Some(inputs) = obj.remove("inputs") {
                obj.entry("with").or_insert(inputs);
            }
        }
    }
}

fn flow_steps_mut(document: &mut Value) -> impl Iterator<Item = &mut Value> {
    document
        .get_mut("flow")
        .and_then(|flow| flow.get_mut("steps"))
        .and_then(Value::as_array_mut)
        .map(|steps| steps.iter_mut())
        .into_iter()
        .flatten()
}
