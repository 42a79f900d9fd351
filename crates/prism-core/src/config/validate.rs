//! Configuration validation with range checks.

use crate::codec::EncodingFormat;
use crate::error::ConfigError;
use crate::output::OutputFormat;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.store.url_expiry_secs == 0 {
            return Err(ConfigError::ValidationError(
                "store.url_expiry_secs must be > 0".into(),
            ));
        }
        if self.pipeline.output_prefix.contains('/') {
            return Err(ConfigError::ValidationError(
                "pipeline.output_prefix must not contain '/'".into(),
            ));
        }
        if EncodingFormat::parse(&self.pipeline.default_output_format).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "pipeline.default_output_format must be one of {}",
                EncodingFormat::supported_list()
            )));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if EncodingFormat::parse(&self.transform.default_format).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "transform.default_format must be one of {}",
                EncodingFormat::supported_list()
            )));
        }
        if !(1..=100).contains(&self.transform.default_quality) {
            return Err(ConfigError::ValidationError(
                "transform.default_quality must be between 1 and 100".into(),
            ));
        }
        if OutputFormat::parse(&self.output.format).is_none() {
            return Err(ConfigError::ValidationError(
                "output.format must be 'json' or 'jsonl'".into(),
            ));
        }
        Ok(())
    }
}
