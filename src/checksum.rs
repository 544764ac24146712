//! Content checksums for stored capability records

use sha2::{Digest, Sha256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// SHA256 checksum of a stored content blob
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum(String);

impl Checksum {
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{:x}", hash))
    }

    /// Checksum of a raw content string (the form stored alongside records)
    pub fn from_content(content: &str) -> Self {
        Self::from_bytes(content.as_bytes())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check that content still matches this checksum
    pub fn verify(&self, content: &str) -> bool {
        *self == Self::from_content(content)
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_is_stable() {
        let content = "id: calc\ndescription: adds numbers\n";
        assert_eq!(Checksum::from_content(content), Checksum::from_content(content));
    }

    #[test]
    fn test_checksum_detects_tamper() {
        let checksum = Checksum::from_content("id: calc");
        assert!(checksum.verify("id: calc"));
        assert!(!checksum.verify("id: calc2"));
    }
}
