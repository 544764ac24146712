//! Schema registry
//!
//! Holds one validation schema per protocol format version and resolves a
//! requested version to the closest registered schema. The baseline `1.0.0`
//! schema is embedded at compile time and is always available, so resolution
//! never fails. A registry is built once at startup and read-only afterward.

use std::collections::BTreeMap;
use std::path::Path;

use include_dir::{include_dir, Dir};
use regex::Regex;
use serde_json::Value;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::Result;
use crate::schema::{baseline_schema, ValidationSchema};
use crate::validate::{self, ValidationReport};
use crate::version::FormatVersion;

/// Schema files shipped with the crate
static BUILTIN_SCHEMAS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/schemas");

/// Version → schema map with deterministic fallback resolution.
pub struct SchemaRegistry {
    /// The always-present `1.0.0` schema, kept out of the map so
    /// [`SchemaRegistry::resolve`] can return a reference unconditionally
    baseline: ValidationSchema,
    schemas: BTreeMap<FormatVersion, ValidationSchema>,
}

impl SchemaRegistry {
    /// Build a registry with the embedded builtin schemas.
    pub fn new() -> Self {
        let mut registry = Self {
            baseline: baseline_schema(),
            schemas: BTreeMap::new(),
        };

        for file in BUILTIN_SCHEMAS.files() {
            let Some(content) = file.contents_utf8() else {
                continue;
            };
            let name = file.path().to_string_lossy();
            match parse_schema_file(&name, content) {
                Ok((version, schema)) => registry.register(version, schema),
                Err(e) => warn!("Skipping builtin schema {name}: {e}"),
            }
        }

        registry
    }

    /// Register a schema for a format version. Registering `1.0.0` replaces
    /// the baseline.
    pub fn register(&mut self, version: FormatVersion, schema: ValidationSchema) {
        info!("Registered schema for version {version}");
        if version == FormatVersion::baseline() {
            self.baseline = schema;
        } else {
            self.schemas.insert(version, schema);
        }
    }

    /// Resolve a requested version to a schema. Never fails:
    ///
    /// 1. exact match,
    /// 2. lowest registered version sharing the same `major.minor` prefix
    ///    (ordered-map iteration makes this deterministic),
    /// 3. the `1.0.0` baseline.
    pub fn resolve(&self, version: &FormatVersion) -> &ValidationSchema {
        if *version == FormatVersion::baseline() {
            return &self.baseline;
        }
        if let Some(schema) = self.schemas.get(version) {
            return schema;
        }
        if let Some((found, schema)) = self
            .schemas
            .iter()
            .find(|(v, _)| v.major_minor() == version.major_minor())
        {
            info!("Using schema version {found} for requested version {version}");
            return schema;
        }
        warn!("No schema found for version {version}, using baseline");
        &self.baseline
    }

    /// All registered versions, sorted ascending.
    pub fn versions(&self) -> Vec<FormatVersion> {
        let mut versions: Vec<_> = self.schemas.keys().cloned().collect();
        versions.push(FormatVersion::baseline());
        versions.sort();
        versions.dedup();
        versions
    }

    /// Load additional schema files (`*.json`) from a directory tree.
    ///
    /// The format version comes from an embedded `version` or
    /// `schemaVersion` field, or failing that from a `\d+.\d+.\d+` match in
    /// the filename. Unreadable files are skipped with a warning; returns
    /// the number of schemas registered.
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize> {
        let mut loaded = 0;
        for entry in WalkDir::new(dir.as_ref())
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.extension().map(|e| e != "json").unwrap_or(true) {
                continue;
            }
            let content = match std::fs::read_to_string(path) {
                Ok(c) => c,
                Err(e) => {
                    warn!("Skipping unreadable schema file {}: {e}", path.display());
                    continue;
                }
            };
            match parse_schema_file(&path.to_string_lossy(), &content) {
                Ok((version, schema)) => {
                    self.register(version, schema);
                    loaded += 1;
                }
                Err(e) => warn!("Skipping schema file {}: {e}", path.display()),
            }
        }
        Ok(loaded)
    }

    /// Validate a document against the schema for its version.
    ///
    /// The version is taken from `version` if given, else the document's
    /// `enact` field, else the baseline.
    pub fn validate_document(
        &self,
        document: &Value,
        strict: bool,
        version: Option<&FormatVersion>,
    ) -> ValidationReport {
        let resolved = match version {
            Some(v) => v.clone(),
            None => document
                .get("enact")
                .and_then(Value::as_str)
                .and_then(|s| FormatVersion::parse(s).ok())
                .unwrap_or_default(),
        };
        validate::validate(document, self.resolve(&resolved), strict)
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse one schema file: extract its format version, then deserialize the
/// schema body.
fn parse_schema_file(name: &str, content: &str) -> Result<(FormatVersion, ValidationSchema)> {
    let value: Value = serde_json::from_str(content)?;

    let embedded = value
        .get("version")
        .or_else(|| value.get("schemaVersion"))
        .and_then(Value::as_str)
        .and_then(|s| FormatVersion::parse(s).ok());

    let version = match embedded {
        Some(v) => v,
        None => version_from_filename(name).ok_or_else(|| {
            crate::error::RegistryError::InvalidVersion(format!(
                "schema file {name} has no version field or versioned filename"
            ))
        })?,
    };

    let schema: ValidationSchema = serde_json::from_value(value)?;
    Ok((version, schema))
}

fn version_from_filename(name: &str) -> Option<FormatVersion> {
    // The pattern cannot fail to compile; treat failure as no match anyway
    let re = Regex::new(r"(\d+\.\d+\.\d+)").ok()?;
    re.captures(name)
        .and_then(|c| c.get(1))
        .and_then(|m| FormatVersion::parse(m.as_str()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn v(s: &str) -> FormatVersion {
        FormatVersion::parse(s).unwrap()
    }

    #[test]
    fn test_baseline_always_registered() {
        let registry = SchemaRegistry::new();
        assert!(registry.versions().contains(&v("1.0.0")));
        let schema = registry.resolve(&v("1.0.0"));
        assert!(schema.required.contains(&"enact".to_string()));
    }

    #[test]
    fn test_exact_match_wins() {
        let mut registry = SchemaRegistry::new();
        registry.register(v("2.0.0"), ValidationSchema::object(&["name"]));
        let schema = registry.resolve(&v("2.0.0"));
        assert_eq!(schema.required, vec!["name"]);
    }

    #[test]
    fn test_major_minor_fallback_is_deterministic() {
        let mut registry = SchemaRegistry::new();
        registry.register(v("2.1.5"), ValidationSchema::object(&["later"]));
        registry.register(v("2.1.1"), ValidationSchema::object(&["earlier"]));
        // lowest same-prefix version wins regardless of registration order
        let schema = registry.resolve(&v("2.1.9"));
        assert_eq!(schema.required, vec!["earlier"]);
    }

    #[test]
    fn test_unknown_version_falls_back_to_baseline() {
        let registry = SchemaRegistry::new();
        let schema = registry.resolve(&v("9.9.9"));
        assert!(schema.required.contains(&"enact".to_string()));
    }

    #[test]
    fn test_validate_document_uses_enact_field() {
        let registry = SchemaRegistry::new();
        let doc = json!({"enact": "1.0.0", "id": "x", "description": "d",
                         "version": "1.0.0", "type": "atomic", "authors": []});
        let report = registry.validate_document(&doc, true, None);
        assert!(report.valid, "errors: {:?}", report.errors);
    }

    #[test]
    fn test_load_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("custom-3.0.0.json"),
            r#"{"type": "object", "required": ["id"]}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("embedded.json"),
            r#"{"version": "4.0.0", "type": "object", "required": ["id", "kind"]}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a schema").unwrap();

        let mut registry = SchemaRegistry::new();
        let loaded = registry.load_dir(dir.path()).unwrap();
        assert_eq!(loaded, 2);
        assert_eq!(registry.resolve(&v("3.0.0")).required, vec!["id"]);
        assert_eq!(registry.resolve(&v("4.0.0")).required, vec!["id", "kind"]);
    }
}
