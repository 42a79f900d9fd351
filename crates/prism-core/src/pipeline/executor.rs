//! Sequential step execution.
//!
//! The executor folds the operation list over one [`Image`]:
//!
//! ```text
//! Ready → Running(0) → Running(1) → … → Done
//! ```
//!
//! A step either replaces the current image (handler returned one) or leaves
//! it in place (read-only handler, handler error, or skipped step). No step
//! outcome ends the run early.

use std::time::Instant;

use crate::args::ArgMap;
use crate::codec::Encoding;
use crate::config::{LimitsConfig, SkipPolicy, TransformConfig};
use crate::operation::{Operation, OperationContext, Registry};
use crate::types::{Image, StepRecord};

use super::request::OperationSpec;

/// Why a step was not attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    UnknownOperation,
    UnusableArguments,
}

impl SkipReason {
    fn message(&self, name: &str) -> String {
        match self {
            Self::UnknownOperation => format!("Unknown operation: {name}"),
            Self::UnusableArguments => {
                format!("Missing or unparseable arguments for operation '{name}'")
            }
        }
    }
}

/// Everything a finished run hands to the aggregator.
#[derive(Debug)]
pub struct Execution {
    /// Image held after the last step
    pub image: Image,
    /// One record per attempted step (and per skipped step under
    /// [`SkipPolicy::Record`]), in execution order
    pub records: Vec<StepRecord>,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Encoding chosen by the last successful step that chose one
    pub encoding: Option<Encoding>,
}

impl Execution {
    fn start(image: Image, capacity: usize) -> Self {
        Self {
            image,
            records: Vec::with_capacity(capacity),
            succeeded: 0,
            failed: 0,
            skipped: 0,
            encoding: None,
        }
    }
}

/// Runs operation lists against images.
#[derive(Debug, Clone, Copy)]
pub struct Executor<'a> {
    registry: &'a Registry,
    skip_policy: SkipPolicy,
    transform: &'a TransformConfig,
    limits: &'a LimitsConfig,
}

impl<'a> Executor<'a> {
    pub fn new(
        registry: &'a Registry,
        skip_policy: SkipPolicy,
        transform: &'a TransformConfig,
        limits: &'a LimitsConfig,
    ) -> Self {
        Self {
            registry,
            skip_policy,
            transform,
            limits,
        }
    }

    /// Apply every operation in order, starting from `source`.
    pub fn execute(&self, bucket: &str, key: &str, source: Image, operations: &[OperationSpec]) -> Execution {
        let ctx = OperationContext {
            bucket,
            key,
            transform: self.transform,
            limits: self.limits,
        };
        let mut execution = Execution::start(source, operations.len());

        for (index, spec) in operations.iter().enumerate() {
            let Some(op) = self.registry.resolve(&spec.name) else {
                self.skip(&mut execution, index, spec, SkipReason::UnknownOperation);
                continue;
            };
            let Some(args) = spec.args.as_ref() else {
                self.skip(&mut execution, index, spec, SkipReason::UnusableArguments);
                continue;
            };
            self.step(&mut execution, &ctx, index, op, args);
        }

        tracing::debug!(
            "Pipeline for {}/{} done: {} succeeded, {} failed, {} skipped",
            bucket,
            key,
            execution.succeeded,
            execution.failed,
            execution.skipped
        );
        execution
    }

    fn step(
        &self,
        execution: &mut Execution,
        ctx: &OperationContext<'_>,
        index: usize,
        op: &dyn Operation,
        args: &ArgMap,
    ) {
        let start = Instant::now();
        let result = op.apply(ctx, args, &execution.image);
        tracing::trace!("  Step {} ({}): {:?}", index, op.name(), start.elapsed());

        match result {
            Ok(applied) => {
                if let Some(image) = applied.image {
                    execution.image = image;
                }
                if applied.encoding.is_some() {
                    execution.encoding = applied.encoding;
                }
                execution.succeeded += 1;
                execution.records.push(StepRecord::completed(
                    index,
                    op.name(),
                    applied.message,
                    applied.summary,
                ));
            }
            Err(e) => {
                tracing::warn!("Step {} ({}) failed for {}: {}", index, op.name(), ctx.key, e);
                execution.failed += 1;
                execution
                    .records
                    .push(StepRecord::failed(index, op.name(), e.to_string()));
            }
        }
    }

    fn skip(&self, execution: &mut Execution, index: usize, spec: &OperationSpec, reason: SkipReason) {
        let message = reason.message(&spec.name);
        tracing::warn!("Skipping step {}: {}", index, message);
        execution.skipped += 1;
        if self.skip_policy == SkipPolicy::Record {
            execution
                .records
                .push(StepRecord::failed(index, spec.name.clone(), message));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::EncodingFormat;
    use crate::types::{ColorMode, StepSummary};
    use image::DynamicImage;

    fn run(policy: SkipPolicy, operations: &[OperationSpec]) -> Execution {
        let transform = TransformConfig::default();
        let limits = LimitsConfig::default();
        let executor = Executor::new(Registry::global(), policy, &transform, &limits);
        let source = Image::new(DynamicImage::new_rgb8(40, 20));
        executor.execute("bucket", "cat.png", source, operations)
    }

    fn op(name: &str, args: ArgMap) -> OperationSpec {
        OperationSpec::new(name, args)
    }

    #[test]
    fn test_empty_pipeline_keeps_source() {
        let execution = run(SkipPolicy::Record, &[]);
        assert!(execution.records.is_empty());
        assert_eq!((execution.image.width(), execution.image.height()), (40, 20));
        assert!(execution.encoding.is_none());
    }

    #[test]
    fn test_image_threads_between_steps() {
        let execution = run(
            SkipPolicy::Record,
            &[
                op("rotate", ArgMap::new().with("rotation_angle", 90)),
                op("grayscale", ArgMap::new()),
            ],
        );
        assert_eq!(execution.succeeded, 2);
        assert_eq!(
            execution.records[1].summary(),
            Some(&StepSummary::Grayscale {
                original_width: 20,
                original_height: 40,
                original_mode: ColorMode::Rgb8,
            })
        );
        assert_eq!(execution.image.mode(), ColorMode::Luma8);
    }

    #[test]
    fn test_failed_step_carries_image_forward() {
        let execution = run(
            SkipPolicy::Record,
            &[
                op("rotate", ArgMap::new().with("rotation_angle", 999)),
                op("resize", ArgMap::new().with("target_width", 0).with("target_height", 5)),
                op("details", ArgMap::new()),
            ],
        );
        assert_eq!((execution.succeeded, execution.failed), (1, 2));
        assert!(execution.records[0].error().is_some());
        assert!(execution.records[1].error().is_some());
        match execution.records[2].summary() {
            Some(StepSummary::Details { width, height, .. }) => assert_eq!((*width, *height), (40, 20)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_skips_recorded_under_record_policy() {
        let execution = run(
            SkipPolicy::Record,
            &[
                op("sharpen", ArgMap::new()),
                OperationSpec {
                    name: "rotate".into(),
                    args: None,
                },
                op("details", ArgMap::new()),
            ],
        );
        assert_eq!(execution.records.len(), 3);
        assert_eq!(execution.skipped, 2);
        assert_eq!(execution.records[0].error(), Some("Unknown operation: sharpen"));
        assert_eq!(
            execution.records[1].error(),
            Some("Missing or unparseable arguments for operation 'rotate'")
        );
        let indices: Vec<_> = execution.records.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_skips_omitted_under_omit_policy() {
        let execution = run(
            SkipPolicy::Omit,
            &[
                op("sharpen", ArgMap::new()),
                OperationSpec {
                    name: "rotate".into(),
                    args: None,
                },
                op("details", ArgMap::new()),
            ],
        );
        assert_eq!(execution.records.len(), 1);
        assert_eq!(execution.skipped, 2);
        assert_eq!(execution.records[0].operation, "details");
        assert_eq!(execution.records[0].index, 2);
    }

    #[test]
    fn test_last_transform_sets_encoding() {
        let execution = run(
            SkipPolicy::Record,
            &[
                op("transform", ArgMap::new().with("target_format", "gif")),
                op("transform", ArgMap::new().with("target_format", "jpeg").with("quality", 70)),
                op("transform", ArgMap::new().with("target_format", "heic")),
                op("grayscale", ArgMap::new()),
            ],
        );
        assert_eq!(
            execution.encoding,
            Some(Encoding::new(EncodingFormat::Jpeg).with_quality(70))
        );
        assert_eq!(execution.failed, 1);
    }

    #[test]
    fn test_case_sensitive_names_are_skipped() {
        let execution = run(SkipPolicy::Record, &[op("Rotate", ArgMap::new().with("rotation_angle", 90))]);
        assert_eq!(execution.skipped, 1);
        assert_eq!((execution.image.width(), execution.image.height()), (40, 20));
    }
}
