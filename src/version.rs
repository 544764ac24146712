//! Protocol format versioning
//!
//! A capability document carries two version strings: its own revision
//! (`version`) and the protocol format version (`enact`) that governs which
//! field shapes are expected. This module models the latter.

use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RegistryError;

/// A protocol format version (the `enact` field of a document)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormatVersion(Version);

impl FormatVersion {
    /// The baseline format version every registry understands
    pub const BASELINE: &'static str = "1.0.0";

    /// Parse a version string, tolerating a leading `v`
    pub fn parse(s: &str) -> Result<Self, RegistryError> {
        let s = s.strip_prefix('v').unwrap_or(s);
        Version::parse(s)
            .map(Self)
            .map_err(|_| RegistryError::InvalidVersion(s.to_string()))
    }

    /// The baseline `1.0.0` version
    pub fn baseline() -> Self {
        Self(Version::new(1, 0, 0))
    }

    /// The `major.minor` prefix used for schema fallback resolution
    pub fn major_minor(&self) -> (u64, u64) {
        (self.0.major, self.0.minor)
    }

    /// Version string without any `v` prefix (e.g. `"1.2.3"`)
    pub fn version_string(&self) -> String {
        self.0.to_string()
    }

    pub fn major(&self) -> u64 {
        self.0.major
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FormatVersion {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Default for FormatVersion {
    fn default() -> Self {
        Self::baseline()
    }
}
