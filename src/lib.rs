//! Enact Capability Registry
//!
//! A catalog of capability documents: machine-executable task definitions
//! with typed inputs/outputs, author metadata, and an execution flow.
//! Documents are ingested as YAML or JSON, normalized into one canonical
//! shape, validated against versioned schemas, stored, searched, and
//! exported back out in either format.
//!
//! ## Features
//!
//! - **Shape Normalization**: three incompatible historical document shapes
//!   converge on a single canonical form
//! - **Versioned Schemas**: one validation schema per protocol format
//!   version, with deterministic fallback resolution
//! - **Permissive Validation**: informational by default, strict on opt-in
//! - **Version Transforms**: structural migration between format versions
//!   with a true inverse rename pair
//! - **Semantic Search**: cosine ranking over description embeddings, with
//!   a fuzzy name-match fallback
//!
//! ## Pipeline
//!
//! ```text
//! raw string (YAML/JSON)
//!   └─ parse::parse_document
//!        └─ registry.validate_document     (non-fatal by default)
//!        └─ capability::normalize          (shape canonicalization,
//!           ├─ normalize::*                 field-level rules,
//!           └─ transform::transform         cross-version rewrite)
//!             └─ CapabilityWrapper → store / API serializer
//! ```

pub mod capability;
pub mod checksum;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod normalize;
pub mod parse;
pub mod registry;
pub mod schema;
pub mod store;
pub mod transform;
pub mod validate;
pub mod version;

pub use checksum::Checksum;
pub use config::RegistryConfig;
pub use document::{CapabilityWrapper, EnactDocument, FlowStep, JsonSchemaField, SchemaObject};
pub use embedding::{cosine_similarity, EmbeddingProvider, SearchHit};
pub use error::{RegistryError, Result};
pub use parse::{parse_document, serialize_document, DocumentFormat};
pub use registry::SchemaRegistry;
pub use schema::ValidationSchema;
pub use store::{CapabilityRecord, CapabilityStore, FileStore, MemoryStore};
pub use validate::{validate, ValidationReport};
pub use version::FormatVersion;
