//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Object-store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Root directory of the filesystem store; each bucket is a subdirectory
    pub root: PathBuf,

    /// Lifetime of generated retrieval references, in seconds
    pub url_expiry_secs: u64,

    /// Secret used to sign retrieval references (supports ${ENV_VAR} syntax)
    pub signing_key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("~/.prism/buckets"),
            url_expiry_secs: 3600,
            signing_key: "${PRISM_SIGNING_KEY}".to_string(),
        }
    }
}

/// What the executor does with steps it cannot even attempt
/// (unknown operation name, absent or unparseable argument map).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkipPolicy {
    /// Archive an error step record so records stay index-aligned with the input
    #[default]
    Record,
    /// Leave no record; the record list is compacted
    Omit,
}

/// Pipeline execution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Prefix applied to the source key when naming the final artifact
    pub output_prefix: String,

    /// Encoding of the final artifact when no transform step chose one
    pub default_output_format: String,

    /// Handling of steps that cannot be attempted
    pub skipped_steps: SkipPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_prefix: "batch_".to_string(),
            default_output_format: "png".to_string(),
            skipped_steps: SkipPolicy::Record,
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum source object size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 100,
            max_image_dimension: 10000,
        }
    }
}

/// Defaults for the `transform` operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Target format when the request names none
    pub default_format: String,

    /// JPEG quality when the request names none (1-100)
    pub default_quality: u8,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            default_format: "JPEG".to_string(),
            default_quality: 85,
        }
    }
}

/// Report output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "json" or "jsonl"
    pub format: String,

    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            pretty: true,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
