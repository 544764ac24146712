//! Capability storage
//!
//! The store treats capability content as an opaque string blob plus a few
//! indexed scalar columns; the normalized wrapper is only consulted for
//! those scalars at write time. Records carry a checksum of the blob and
//! creation/update timestamps. On read, content can be converted to another
//! format version through the transformer, preserving the original
//! serialization format (YAML in, YAML out).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::checksum::Checksum;
use crate::document::CapabilityWrapper;
use crate::error::{RegistryError, Result};
use crate::parse::{self, DocumentFormat};
use crate::transform;
use crate::version::FormatVersion;

/// One stored capability: indexed scalars plus the opaque content blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    pub version: String,
    /// `atomic` or `composite`
    pub capability_type: String,
    pub format_version: FormatVersion,
    pub checksum: Checksum,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// The original YAML or JSON content, stored verbatim
    pub content: String,
    /// Embedding of the description, when a provider was configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl CapabilityRecord {
    fn new(
        wrapper: &CapabilityWrapper,
        raw_content: &str,
        format_version: &FormatVersion,
        embedding: Option<Vec<f32>>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: wrapper.id.clone(),
            name: wrapper.name.clone(),
            description: wrapper.description.clone(),
            version: wrapper.version.clone(),
            capability_type: if wrapper.is_atomic {
                "atomic".to_string()
            } else {
                "composite".to_string()
            },
            format_version: format_version.clone(),
            checksum: Checksum::from_content(raw_content),
            created_at: now,
            updated_at: now,
            content: raw_content.to_string(),
            embedding,
        }
    }

    /// Content converted to the requested format version. The serialization
    /// format of the stored blob is preserved.
    pub fn content_as(&self, format: Option<&FormatVersion>) -> Result<String> {
        let Some(target) = format else {
            return Ok(self.content.clone());
        };
        if *target == self.format_version {
            return Ok(self.content.clone());
        }
        let serialization = DocumentFormat::detect(&self.content);
        let document = parse::parse_document(&self.content)?;
        let converted = transform::transform(&document, &self.format_version, target);
        parse::serialize_document(&converted, serialization)
    }

    /// Verify the content blob against its checksum
    pub fn verify(&self) -> bool {
        self.checksum.verify(&self.content)
    }
}

/// Narrow storage interface the rest of the registry depends on.
pub trait CapabilityStore {
    /// Insert or replace a capability. Replacing keeps the original
    /// `created_at`.
    fn store(
        &mut self,
        wrapper: &CapabilityWrapper,
        raw_content: &str,
        format_version: &FormatVersion,
        embedding: Option<Vec<f32>>,
    ) -> Result<()>;

    /// Raw content by id, optionally converted to a format version.
    fn get_by_id(&self, id: &str, format: Option<&FormatVersion>) -> Result<Option<String>>;

    /// Full record by id.
    fn get_record(&self, id: &str) -> Result<Option<CapabilityRecord>>;

    /// All records, sorted by id. With a preferred format, each record's
    /// content is converted; records whose content cannot be converted are
    /// skipped rather than aborting the listing.
    fn list_all(&self, format: Option<&FormatVersion>) -> Result<Vec<CapabilityRecord>>;

    /// Delete by id. [`RegistryError::NotFound`] when absent.
    fn delete(&mut self, id: &str) -> Result<()>;
}

fn convert_records(
    records: impl IntoIterator<Item = CapabilityRecord>,
    format: Option<&FormatVersion>,
) -> Vec<CapabilityRecord> {
    let mut out = Vec::new();
    for mut record in records {
        match record.content_as(format) {
            Ok(content) => {
                record.content = content;
                if let Some(target) = format {
                    record.format_version = target.clone();
                }
                out.push(record);
            }
            Err(e) => warn!("Skipping capability {} in listing: {e}", record.id),
        }
    }
    out.sort_by(|a, b| a.id.cmp(&b.id));
    out
}

/// File-backed store: one JSON record per capability under `catalog/`.
pub struct FileStore {
    catalog: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `path`, creating the catalog directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let catalog = path.as_ref().join("catalog");
        fs::create_dir_all(&catalog)?;
        Ok(Self { catalog })
    }

    fn record_path(&self, id: &str) -> Result<PathBuf> {
        // Record files are named by id, so ids must be filesystem-safe
        if id.is_empty()
            || id.starts_with('.')
            || id.contains(['/', '\\'])
        {
            return Err(RegistryError::InvalidId(id.to_string()));
        }
        Ok(self.catalog.join(format!("{id}.json")))
    }

    fn read_record(&self, path: &Path) -> Result<CapabilityRecord> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl CapabilityStore for FileStore {
    fn store(
        &mut self,
        wrapper: &CapabilityWrapper,
        raw_content: &str,
        format_version: &FormatVersion,
        embedding: Option<Vec<f32>>,
    ) -> Result<()> {
        let path = self.record_path(&wrapper.id)?;
        let mut record = CapabilityRecord::new(wrapper, raw_content, format_version, embedding);
        if path.exists() {
            if let Ok(existing) = self.read_record(&path) {
                record.created_at = existing.created_at;
            }
        }
        fs::write(&path, serde_json::to_string_pretty(&record)?)?;
        info!(
            "Stored capability {} with format version {format_version}",
            wrapper.id
        );
        Ok(())
    }

    fn get_by_id(&self, id: &str, format: Option<&FormatVersion>) -> Result<Option<String>> {
        match self.get_record(id)? {
            Some(record) => Ok(Some(record.content_as(format)?)),
            None => Ok(None),
        }
    }

    fn get_record(&self, id: &str) -> Result<Option<CapabilityRecord>> {
        let path = self.record_path(id)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(self.read_record(&path)?))
    }

    fn list_all(&self, format: Option<&FormatVersion>) -> Result<Vec<CapabilityRecord>> {
        let mut records = Vec::new();
        for entry in fs::read_dir(&self.catalog)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                match self.read_record(&path) {
                    Ok(record) => records.push(record),
                    Err(e) => warn!("Skipping unreadable record {}: {e}", path.display()),
                }
            }
        }
        Ok(convert_records(records, format))
    }

    fn delete(&mut self, id: &str) -> Result<()> {
        let path = self.record_path(id)?;
        if !path.exists() {
            return Err(RegistryError::NotFound(id.to_string()));
        }
        fs::remove_file(&path)?;
        info!("Deleted capability {id}");
        Ok(())
    }
}

/// In-memory store, mainly for tests and embedding experiments.
#[derive(Default)]
pub struct MemoryStore {
    records: BTreeMap<String, CapabilityRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CapabilityStore for MemoryStore {
    fn store(
        &mut self,
        wrapper: &CapabilityWrapper,
        raw_content: &str,
        format_version: &FormatVersion,
        embedding: Option<Vec<f32>>,
    ) -> Result<()> {
        let mut record = CapabilityRecord::new(wrapper, raw_content, format_version, embedding);
        if let Some(existing) = self.records.get(&record.id) {
            record.created_at = existing.created_at;
        }
        self.records.insert(record.id.clone(), record);
        Ok(())
    }

    fn get_by_id(&self, id: &str, format: Option<&FormatVersion>) -> Result<Option<String>> {
        match self.records.get(id) {
            Some(record) => Ok(Some(record.content_as(format)?)),
            None => Ok(None),
        }
    }

    fn get_record(&self, id: &str) -> Result<Option<CapabilityRecord>> {
        Ok(self.records.get(id).cloned())
    }

    fn list_all(&self, format: Option<&FormatVersion>) -> Result<Vec<CapabilityRecord>> {
        Ok(convert_records(self.records.values().cloned(), format))
    }

    fn delete(&mut self, id: &str) -> Result<()> {
        self.records
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }
}
