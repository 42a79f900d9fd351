//! The pipeline engine.
//!
//! A run has three stages:
//! - **request**: validate the top-level request and parse the operation list
//! - **executor**: fetch once, then apply each operation in order, threading
//!   the current image and recording every step
//! - **aggregator**: persist the final image once and build the report
//!
//! Only request validation, the source fetch and the final persist can fail a
//! run. Step failures end up in the step records.

pub mod aggregator;
pub mod executor;
pub mod request;

pub use aggregator::Aggregator;
pub use executor::{Execution, Executor, SkipReason};
pub use request::{OperationSpec, PipelineRequest};

use std::time::Instant;

use crate::config::Config;
use crate::error::PipelineResult;
use crate::operation::Registry;
use crate::store::ImageRepository;
use crate::types::PipelineReport;

/// Execute one pipeline request end to end.
pub fn run_pipeline(
    repository: &ImageRepository,
    config: &Config,
    request: &PipelineRequest,
) -> PipelineResult<PipelineReport> {
    let started = Instant::now();
    tracing::debug!(
        "Running {} operations on {}/{}",
        request.operations.len(),
        request.bucket,
        request.key
    );

    let source = repository.fetch_image(&request.bucket, &request.key)?;
    tracing::trace!("  Fetch: {:?}", started.elapsed());

    let executor = Executor::new(
        Registry::global(),
        config.pipeline.skipped_steps,
        &config.transform,
        &config.limits,
    );
    let execution = executor.execute(&request.bucket, &request.key, source, &request.operations);

    Aggregator::new(
        repository,
        &config.pipeline.output_prefix,
        config.default_output_format(),
    )
    .finish(
        &request.bucket,
        &request.key,
        execution,
        request.operations.len(),
        started,
    )
}
