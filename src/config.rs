//! Configuration for the capability registry
//!
//! Layered: defaults, then `enact.toml` (working dir or XDG config dir),
//! then `ENACT_*` environment variables.
//!
//! ## Example config file (enact.toml):
//! ```toml
//! [store]
//! path = "./registry"
//!
//! [schemas]
//! dir = "./schemas.d"
//!
//! [validation]
//! strict = false
//!
//! [format]
//! default_version = "1.0.0"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level registry configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub schemas: SchemasConfig,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub format: FormatConfig,
}

/// Where capability records live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

/// Optional directory of extra schema files loaded at startup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemasConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Reject documents with validation errors instead of warning
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatConfig {
    /// Format version assumed for documents that do not declare one
    #[serde(default = "default_format_version")]
    pub default_version: String,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("./registry")
}

fn default_format_version() -> String {
    crate::version::FormatVersion::BASELINE.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            default_version: default_format_version(),
        }
    }
}

impl RegistryConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, optionally forcing a specific file
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        for location in ["enact.toml", ".enact.toml"] {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(dirs) = directories::ProjectDirs::from("dev", "enact", "registry") {
            let xdg_config = dirs.config_dir().join("enact.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("ENACT")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Store path resolved against the working directory
    pub fn store_path(&self) -> PathBuf {
        if self.store.path.is_absolute() {
            self.store.path.clone()
        } else {
            std::env::current_dir()
                .unwrap_or_default()
                .join(&self.store.path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RegistryConfig::default();
        assert!(!config.validation.strict);
        assert_eq!(config.format.default_version, "1.0.0");
        assert_eq!(config.store.path, PathBuf::from("./registry"));
    }

    #[test]
    fn test_serialize_config() {
        let config = RegistryConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[store]"));
        assert!(toml_str.contains("[validation]"));
    }
}
