//! Final persist and report assembly.

use std::time::Instant;

use crate::codec::{Encoding, EncodingFormat};
use crate::error::PipelineResult;
use crate::operation::derive_key;
use crate::store::ImageRepository;
use crate::types::PipelineReport;

use super::executor::Execution;

/// Persists the final image of a run and builds its report.
#[derive(Clone, Copy)]
pub struct Aggregator<'a> {
    repository: &'a ImageRepository,
    output_prefix: &'a str,
    default_format: EncodingFormat,
}

impl<'a> Aggregator<'a> {
    pub fn new(repository: &'a ImageRepository, output_prefix: &'a str, default_format: EncodingFormat) -> Self {
        Self {
            repository,
            output_prefix,
            default_format,
        }
    }

    /// Write the final image exactly once and assemble the report.
    ///
    /// The image is encoded as the last successful `transform` chose, or in
    /// the default format. A persist failure discards the step records and
    /// fails the run; a failed retrieval reference only leaves
    /// `output_reference` unset.
    pub fn finish(
        &self,
        bucket: &str,
        key: &str,
        execution: Execution,
        operations_count: usize,
        started: Instant,
    ) -> PipelineResult<PipelineReport> {
        let encoding = execution
            .encoding
            .unwrap_or_else(|| Encoding::new(self.default_format));
        let output_key = derive_key(key, self.output_prefix, Some(encoding.format.extension()));

        if let Err(e) = self
            .repository
            .store_image(bucket, &output_key, &execution.image, encoding)
        {
            tracing::debug!(
                "Discarding {} step records after persist failure",
                execution.records.len()
            );
            return Err(e);
        }

        let output_reference = match self.repository.get_retrieval_reference(bucket, &output_key) {
            Ok(reference) => Some(reference),
            Err(e) => {
                tracing::warn!("No retrieval reference for {}/{}: {}", bucket, output_key, e);
                None
            }
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            "Processed {}/{} -> {} ({} steps, {}ms)",
            bucket,
            key,
            output_key,
            operations_count,
            elapsed_ms
        );

        Ok(PipelineReport {
            message: "Successfully processed image.".to_string(),
            operations_count,
            succeeded_count: execution.succeeded,
            failed_count: execution.failed,
            skipped_count: execution.skipped,
            step_records: execution.records,
            output_key,
            output_format: encoding.format.name().to_string(),
            output_reference,
            url_expires_in_seconds: self.repository.url_expiry().as_secs(),
            elapsed_ms,
        })
    }
}
