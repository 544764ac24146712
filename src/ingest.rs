//! Document ingestion pipeline
//!
//! The write path behind the CLI: parse, optionally transform to a target
//! format version, validate, normalize, embed, store. When a target version
//! is given the document is transformed first and the stored blob is the
//! transformed rendition in the source serialization format, so a record's
//! format version always matches its content and validation reports on what
//! actually gets stored.

use serde_json::Value;

use crate::capability;
use crate::document::CapabilityWrapper;
use crate::embedding::EmbeddingProvider;
use crate::error::{RegistryError, Result};
use crate::parse::{self, DocumentFormat};
use crate::registry::SchemaRegistry;
use crate::store::CapabilityStore;
use crate::transform;
use crate::version::FormatVersion;

/// Ingest one raw document string. Returns the stored wrapper and the
/// validation warnings.
///
/// Validation is permissive unless `strict`; strict failures reject the
/// document before anything is written. With a provider, the capability
/// description is embedded and stored alongside the record.
pub fn ingest(
    store: &mut dyn CapabilityStore,
    schemas: &SchemaRegistry,
    content: &str,
    strict: bool,
    target: Option<&FormatVersion>,
    provider: Option<&dyn EmbeddingProvider>,
) -> Result<(CapabilityWrapper, Vec<String>)> {
    let serialization = DocumentFormat::detect(content);
    let document = parse::parse_document(content)?;
    let source = document_version(&document);

    let (document, content) = match target {
        Some(target) if *target != source => {
            let converted = transform::transform(&document, &source, target);
            let rendered = parse::serialize_document(&converted, serialization)?;
            (converted, rendered)
        }
        _ => (document, content.to_string()),
    };

    // The transformed document carries the target in its enact field, so
    // schema resolution follows the shape being stored.
    let report = schemas.validate_document(&document, strict, None);
    if strict && !report.valid {
        return Err(RegistryError::Validation(report.errors));
    }

    let wrapper = capability::normalize(&document, None)?;
    let format_version =
        FormatVersion::parse(&wrapper.protocol_details.enact).unwrap_or_default();

    let embedding = match provider {
        Some(provider) => Some(provider.embed(&wrapper.description)?),
        None => None,
    };

    store.store(&wrapper, &content, &format_version, embedding)?;
    Ok((wrapper, report.warnings))
}

fn document_version(document: &Value) -> FormatVersion {
    document
        .get("enact")
        .or_else(|| document.get("protocolDetails").and_then(|d| d.get("enact")))
        .and_then(Value::as_str)
        .and_then(|s| FormatVersion::parse(s).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    const LEGACY: &str = "enact: 1.0.0\nid: fetcher\ndescription: fetches things\nversion: 1.0.0\ntype: composite\nauthors:\n  - name: Ada\nflow:\n  steps:\n    - task: fetch\n      with:\n        url: source\n";

    fn v(s: &str) -> FormatVersion {
        FormatVersion::parse(s).unwrap()
    }

    #[test]
    fn test_strict_rejects_before_storing() {
        let registry = SchemaRegistry::new();
        let mut store = MemoryStore::new();
        let err = ingest(&mut store, &registry, "id: only-an-id\n", true, None, None).unwrap_err();
        assert!(matches!(err, RegistryError::Validation(_)));
        assert!(store.get_record("only-an-id").unwrap().is_none());
    }

    #[test]
    fn test_permissive_stores_and_reports_warnings() {
        let registry = SchemaRegistry::new();
        let mut store = MemoryStore::new();
        let (wrapper, warnings) =
            ingest(&mut store, &registry, "id: x\ndescription: d\n", false, None, None).unwrap();
        assert_eq!(wrapper.id, "x");
        assert!(!warnings.is_empty());
        assert!(store.get_record("x").unwrap().is_some());
    }

    #[test]
    fn test_target_version_transforms_stored_content() {
        let registry = SchemaRegistry::new();
        let mut store = MemoryStore::new();
        let (wrapper, _) =
            ingest(&mut store, &registry, LEGACY, false, Some(&v("2.0.0")), None).unwrap();
        assert_eq!(wrapper.protocol_details.enact, "2.0.0");

        let record = store.get_record("fetcher").unwrap().unwrap();
        assert_eq!(record.format_version, v("2.0.0"));
        let stored = parse::parse_document(&record.content).unwrap();
        assert_eq!(stored["enact"], json!("2.0.0"));
        assert_eq!(stored["flow"]["steps"][0]["capability"], json!("fetch"));
        assert!(stored["flow"]["steps"][0].get("task").is_none());
    }

    #[test]
    fn test_target_equal_to_source_stores_verbatim() {
        let registry = SchemaRegistry::new();
        let mut store = MemoryStore::new();
        ingest(&mut store, &registry, LEGACY, false, Some(&v("1.0.0")), None).unwrap();
        let record = store.get_record("fetcher").unwrap().unwrap();
        assert_eq!(record.content, LEGACY);
        assert_eq!(record.format_version, v("1.0.0"));
    }

    #[test]
    fn test_provider_embeds_description() {
        struct Fixed;
        impl EmbeddingProvider for Fixed {
            fn embed(&self, _text: &str) -> Result<Vec<f32>> {
                Ok(vec![1.0, 0.0])
            }
        }

        let registry = SchemaRegistry::new();
        let mut store = MemoryStore::new();
        ingest(&mut store, &registry, LEGACY, false, None, Some(&Fixed)).unwrap();
        let record = store.get_record("fetcher").unwrap().unwrap();
        assert_eq!(record.embedding, Some(vec![1.0, 0.0]));
    }
}
