//! Configuration management for Prism.
//!
//! Configuration is loaded from `~/.prism/config.toml` with sensible defaults.
//! Every section implements `Default`, so a partial file only overrides what
//! it names.

mod types;
mod validate;

pub use types::*;

use crate::codec::EncodingFormat;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure for Prism.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Object-store settings
    pub store: StoreConfig,

    /// Pipeline execution settings
    pub pipeline: PipelineConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Transform operation defaults
    pub transform: TransformConfig,

    /// Report output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.prism.prism/config.toml
    /// - Linux: ~/.config/prism/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\prism\config\config.toml
    ///
    /// Falls back to ~/.prism/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "prism", "prism")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".prism").join("config.toml")
            })
    }

    /// Get the resolved store root (with ~ expansion).
    pub fn store_root(&self) -> PathBuf {
        let path_str = self.store.root.to_string_lossy();
        let expanded = shellexpand::tilde(&path_str);
        PathBuf::from(expanded.into_owned())
    }

    /// Resolve the signing key, expanding `${ENV_VAR}` references.
    ///
    /// An unset variable resolves to an empty key rather than an error, so a
    /// fresh install works without any environment set up.
    pub fn signing_key(&self) -> String {
        match shellexpand::env(&self.store.signing_key) {
            Ok(expanded) => expanded.into_owned(),
            Err(e) => {
                tracing::debug!("Signing key not resolved ({e}); using empty key");
                String::new()
            }
        }
    }

    /// Lifetime of retrieval references.
    pub fn url_expiry(&self) -> Duration {
        Duration::from_secs(self.store.url_expiry_secs)
    }

    /// Encoding used for the final artifact when no transform chose one.
    ///
    /// Falls back to PNG if the configured name is not a supported format;
    /// [`Config::validate`] rejects such files at load time.
    pub fn default_output_format(&self) -> EncodingFormat {
        EncodingFormat::parse(&self.pipeline.default_output_format).unwrap_or(EncodingFormat::Png)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.store.url_expiry_secs, 3600);
        assert_eq!(config.pipeline.output_prefix, "batch_");
        assert_eq!(config.pipeline.skipped_steps, SkipPolicy::Record);
        assert_eq!(config.limits.max_file_size_mb, 100);
        assert_eq!(config.transform.default_quality, 85);
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[store]"));
        assert!(toml.contains("[pipeline]"));
        assert!(toml.contains("skipped_steps = \"record\""));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [pipeline]
            skipped_steps = "omit"
            "#,
        )
        .unwrap();
        assert_eq!(config.pipeline.skipped_steps, SkipPolicy::Omit);
        assert_eq!(config.pipeline.output_prefix, "batch_");
        assert_eq!(config.transform.default_format, "JPEG");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[store]\nroot = \"/srv/buckets\"\nurl_expiry_secs = 60\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.store_root(), PathBuf::from("/srv/buckets"));
        assert_eq!(config.url_expiry(), Duration::from_secs(60));
    }

    #[test]
    fn test_load_from_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[transform]\ndefault_quality = 0\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("default_quality"));
    }

    #[test]
    fn test_default_output_format() {
        let mut config = Config::default();
        assert_eq!(config.default_output_format(), EncodingFormat::Png);
        config.pipeline.default_output_format = "jpeg".into();
        assert_eq!(config.default_output_format(), EncodingFormat::Jpeg);
    }

    #[test]
    fn test_literal_signing_key() {
        let mut config = Config::default();
        config.store.signing_key = "s3cret".into();
        assert_eq!(config.signing_key(), "s3cret");
    }
}
