//! End-to-end tests for the normalization pipeline
//!
//! Drives the full path a document takes through the registry: parse,
//! validate, normalize, store, convert, export.

use enact_registry::{
    capability, embedding, ingest, parse, transform, CapabilityStore, DocumentFormat, FileStore,
    FormatVersion, MemoryStore, RegistryError, SchemaRegistry,
};

const CALC_YAML: &str = include_str!("fixtures/calc.yaml");
const LEGACY_YAML: &str = include_str!("fixtures/legacy_flat.yaml");
const CANONICAL_JSON: &str = include_str!("fixtures/canonical.json");

fn v(s: &str) -> FormatVersion {
    FormatVersion::parse(s).unwrap()
}

// =============================================================================
// Normalization
// =============================================================================

#[test]
fn test_legacy_and_canonical_shapes_converge() {
    let legacy = parse::parse_document(LEGACY_YAML).unwrap();
    let canonical = parse::parse_document(CANONICAL_JSON).unwrap();

    let from_legacy = capability::normalize(&legacy, None).unwrap();
    let mut from_canonical = capability::normalize(&canonical, None).unwrap();

    // The fixtures declare different protocol versions on purpose; every
    // other canonical field must be identical.
    assert_eq!(from_legacy.protocol_details.enact, "1.0.0");
    assert_eq!(from_canonical.protocol_details.enact, "2.0.0");
    from_canonical.protocol_details.enact = "1.0.0".to_string();
    assert_eq!(from_legacy, from_canonical);
}

#[test]
fn test_calc_scenario_end_to_end() {
    let raw = parse::parse_document(CALC_YAML).unwrap();
    let wrapper = capability::normalize(&raw, None).unwrap();

    assert!(wrapper.is_atomic);
    assert_eq!(wrapper.name, "calc");
    let details = &wrapper.protocol_details;
    assert_eq!(details.inputs.properties["a"].field_type.as_deref(), Some("number"));
    assert_eq!(details.inputs.properties["b"].field_type.as_deref(), Some("number"));
    assert_eq!(details.flow.steps.len(), 1);
    assert_eq!(details.flow.steps[0].capability, "calc");
    assert!(details.flow.steps[0].inputs.is_empty());
    assert!(details.flow.steps[0].dependencies.is_empty());
}

#[test]
fn test_normalization_is_idempotent_for_fixtures() {
    for fixture in [CALC_YAML, LEGACY_YAML, CANONICAL_JSON] {
        let raw = parse::parse_document(fixture).unwrap();
        let once = capability::normalize(&raw, None).unwrap();
        let reserialized = serde_json::to_value(&once).unwrap();
        let twice = capability::normalize(&reserialized, None).unwrap();
        assert_eq!(once, twice);
    }
}

// =============================================================================
// Validation against the builtin schema
// =============================================================================

#[test]
fn test_legacy_fixture_validates_permissively() {
    let registry = SchemaRegistry::new();
    let raw = parse::parse_document(LEGACY_YAML).unwrap();
    let report = registry.validate_document(&raw, false, None);
    assert!(report.valid, "errors: {:?}", report.errors);
}

#[test]
fn test_calc_fixture_missing_authors_only_fails_strict() {
    let registry = SchemaRegistry::new();
    let raw = parse::parse_document(CALC_YAML).unwrap();

    let permissive = registry.validate_document(&raw, false, None);
    assert!(permissive.valid);
    assert!(!permissive.warnings.is_empty());

    let strict = registry.validate_document(&raw, true, None);
    assert!(!strict.valid);
}

// =============================================================================
// Storage and format conversion
// =============================================================================

#[test]
fn test_ingest_store_export_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileStore::open(dir.path()).unwrap();

    let raw = parse::parse_document(LEGACY_YAML).unwrap();
    let wrapper = capability::normalize(&raw, None).unwrap();
    store.store(&wrapper, LEGACY_YAML, &v("1.0.0"), None).unwrap();

    // stored verbatim
    let stored = store.get_by_id("image-pipeline", None).unwrap().unwrap();
    assert_eq!(stored, LEGACY_YAML);

    // exported at 2.0.0, still YAML, steps re-keyed
    let exported = store
        .get_by_id("image-pipeline", Some(&v("2.0.0")))
        .unwrap()
        .unwrap();
    assert_eq!(DocumentFormat::detect(&exported), DocumentFormat::Yaml);
    let value = parse::parse_document(&exported).unwrap();
    assert_eq!(value["enact"], serde_json::json!("2.0.0"));
    assert_eq!(
        value["flow"]["steps"][0]["capability"],
        serde_json::json!("fetch-image")
    );

    // and back down again restores the legacy keying
    let source = parse::parse_document(&exported).unwrap();
    let restored = transform::transform(&source, &v("2.0.0"), &v("1.0.0"));
    assert_eq!(
        restored["flow"]["steps"][0]["task"],
        serde_json::json!("fetch-image")
    );
    assert_eq!(
        restored["flow"]["steps"][0]["with"]["url"],
        serde_json::json!("source_url")
    );
}

#[test]
fn test_ingest_with_target_version_stores_converted_content() {
    let registry = SchemaRegistry::new();
    let mut store = MemoryStore::new();

    let (wrapper, _) = ingest::ingest(
        &mut store,
        &registry,
        LEGACY_YAML,
        false,
        Some(&v("2.0.0")),
        None,
    )
    .unwrap();
    assert_eq!(wrapper.protocol_details.enact, "2.0.0");

    // The record's label and its content agree.
    let record = store.get_record("image-pipeline").unwrap().unwrap();
    assert_eq!(record.format_version, v("2.0.0"));
    assert_eq!(DocumentFormat::detect(&record.content), DocumentFormat::Yaml);
    let stored = parse::parse_document(&record.content).unwrap();
    assert_eq!(stored["enact"], serde_json::json!("2.0.0"));
    assert_eq!(
        stored["flow"]["steps"][0]["capability"],
        serde_json::json!("fetch-image")
    );
    assert!(stored["flow"]["steps"][0].get("task").is_none());

    // Exporting back down restores the legacy keying.
    let downgraded = store
        .get_by_id("image-pipeline", Some(&v("1.0.0")))
        .unwrap()
        .unwrap();
    let value = parse::parse_document(&downgraded).unwrap();
    assert_eq!(value["enact"], serde_json::json!("1.0.0"));
    assert_eq!(
        value["flow"]["steps"][0]["task"],
        serde_json::json!("fetch-image")
    );
    assert_eq!(
        value["flow"]["steps"][0]["with"]["url"],
        serde_json::json!("source_url")
    );
}

#[test]
fn test_batch_ingest_continues_past_failures() {
    let registry = SchemaRegistry::new();
    let mut store = MemoryStore::new();
    let documents = [CALC_YAML, "{broken json", LEGACY_YAML, "just a string"];

    let mut stored = 0;
    let mut failed = 0;
    for content in documents {
        match ingest::ingest(&mut store, &registry, content, false, None, None) {
            Ok(_) => stored += 1,
            Err(_) => failed += 1,
        }
    }

    assert_eq!(stored, 2);
    assert_eq!(failed, 2);
    assert_eq!(store.list_all(None).unwrap().len(), 2);
}

#[test]
fn test_not_found_propagates() {
    let mut store = MemoryStore::new();
    assert!(store.get_by_id("ghost", None).unwrap().is_none());
    assert!(matches!(
        store.delete("ghost"),
        Err(RegistryError::NotFound(_))
    ));
}

// =============================================================================
// Search
// =============================================================================

#[test]
fn test_fuzzy_search_over_stored_records() {
    let mut store = MemoryStore::new();
    for content in [CALC_YAML, LEGACY_YAML] {
        let raw = parse::parse_document(content).unwrap();
        let wrapper = capability::normalize(&raw, None).unwrap();
        store.store(&wrapper, content, &v("1.0.0"), None).unwrap();
    }

    let records = store.list_all(None).unwrap();
    let hits = embedding::search(&records, "resize image", None, 5).unwrap();
    assert!(!hits.is_empty());
    assert_eq!(hits[0].id, "image-pipeline");
}
