//! Prism Core - Embeddable image transformation pipeline.
//!
//! Prism takes a stored source image and an ordered list of named
//! operations, applies them one after another, persists the final image once,
//! and returns a structured report with one record per step.
//!
//! # Architecture
//!
//! ```text
//! Request → Fetch → details/rotate/resize/grayscale/brightness/transform … → Persist → Report
//! ```
//!
//! A failing step never aborts a run: its error is recorded and the image it
//! was given carries forward to the next step. Only an invalid request, a
//! failed source fetch or a failed final persist fail the run as a whole.
//!
//! # Usage
//!
//! ```rust,ignore
//! use prism_core::{Config, Prism};
//! use serde_json::json;
//!
//! let prism = Prism::with_local_store(Config::load()?);
//! let response = prism.handle(&json!({
//!     "bucket_id": "photos",
//!     "object_id": "cat.jpg",
//!     "operations": [["rotate", {"rotation_angle": 90}], ["grayscale", {}]]
//! }));
//! println!("{}", serde_json::to_string_pretty(&response)?);
//! ```

pub mod args;
pub mod codec;
pub mod config;
pub mod error;
pub mod operation;
pub mod output;
pub mod pipeline;
pub mod store;
pub mod types;

use std::sync::Arc;

use serde_json::Value;

// Re-exports for convenient access
pub use args::{ArgMap, ArgValue};
pub use codec::{Encoding, EncodingFormat, ImageCodec};
pub use config::{Config, SkipPolicy};
pub use error::{
    ConfigError, OperationError, PipelineError, PipelineResult, PrismError, Result, StoreError,
};
pub use operation::standalone::StandaloneRequest;
pub use operation::{Operation, Registry};
pub use output::{OutputFormat, ReportWriter};
pub use pipeline::{OperationSpec, PipelineRequest};
pub use store::{ImageRepository, LocalObjectStore, MemoryObjectStore, ObjectStore};
pub use types::{
    ColorMode, ExifData, Image, PipelineReport, PipelineResponse, Response, StandaloneReport,
    StepOutcome, StepRecord, StepSummary,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prism engine bound to a configuration and an object store.
///
/// Cheap to clone; clones share the store. Runs are independent, so one
/// instance can serve concurrent requests from several threads.
#[derive(Clone)]
pub struct Prism {
    config: Arc<Config>,
    repository: ImageRepository,
}

impl Prism {
    /// Create a Prism instance over any object store.
    pub fn new(config: Config, store: Arc<dyn ObjectStore>) -> Self {
        tracing::debug!("Initializing Prism v{}", VERSION);
        let repository = ImageRepository::new(store, ImageCodec::new(config.limits.clone()))
            .with_url_expiry(config.url_expiry());
        Self {
            config: Arc::new(config),
            repository,
        }
    }

    /// Create a Prism instance over the filesystem store configured in `[store]`.
    pub fn with_local_store(config: Config) -> Self {
        let store = LocalObjectStore::new(config.store_root(), &config.signing_key());
        Self::new(config, Arc::new(store))
    }

    /// Get a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn repository(&self) -> &ImageRepository {
        &self.repository
    }

    /// Run a parsed pipeline request.
    pub fn run(&self, request: &PipelineRequest) -> PipelineResult<PipelineReport> {
        pipeline::run_pipeline(&self.repository, &self.config, request)
    }

    /// Validate and run a JSON pipeline request.
    ///
    /// Never fails: errors become the `{"error": ...}` response.
    pub fn handle(&self, request: &Value) -> PipelineResponse {
        let result = PipelineRequest::from_json(request).and_then(|request| self.run(&request));
        if let Err(e) = &result {
            tracing::warn!("Pipeline failed: {}", e);
        }
        result.into()
    }

    /// Run a single operation directly against a stored image.
    pub fn run_operation(&self, request: &StandaloneRequest) -> PipelineResult<StandaloneReport> {
        operation::run_standalone(&self.repository, &self.config, request)
    }

    /// Validate and run a flat JSON single-operation request.
    pub fn handle_operation(&self, operation: &str, request: &Value) -> Response<StandaloneReport> {
        StandaloneRequest::from_json(operation, request)
            .and_then(|request| self.run_operation(&request))
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::DynamicImage;
    use serde_json::json;

    fn prism_with_source() -> (Arc<MemoryObjectStore>, Prism) {
        let store = Arc::new(MemoryObjectStore::new());
        let bytes = codec::encode(&DynamicImage::new_rgb8(16, 8), EncodingFormat::Png, None).unwrap();
        store.insert("photos", "cat.png", bytes);
        let prism = Prism::new(Config::default(), store.clone());
        (store, prism)
    }

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_handle_success_shape() {
        let (_, prism) = prism_with_source();
        let response = prism.handle(&json!({
            "bucket_id": "photos",
            "object_id": "cat.png",
            "operations": [["details", {}]]
        }));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], "Successfully processed image.");
        assert_eq!(json["operations_count"], 1);
        assert_eq!(json["step_records"][0]["width"], 16);
        assert_eq!(json["output_key"], "batch_cat.png");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_handle_validation_error_has_no_side_effects() {
        let (store, prism) = prism_with_source();
        let response = prism.handle(&json!({"bucket_id": "photos"}));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            json!({"error": "Missing request parameters: object_id, operations"})
        );
        assert_eq!(store.put_count(), 0);
    }

    #[test]
    fn test_handle_operation() {
        let (store, prism) = prism_with_source();
        let response = prism.handle_operation(
            "resize",
            &json!({"bucketname": "photos", "filename": "cat.png", "target_width": 4, "target_height": 2}),
        );
        assert!(response.is_success());
        assert!(store.contains("photos", "resized_cat.png"));
    }

    #[test]
    fn test_expiry_from_config() {
        let mut config = Config::default();
        config.store.url_expiry_secs = 120;
        let prism = Prism::new(config, Arc::new(MemoryObjectStore::new()));
        assert_eq!(prism.repository().url_expiry().as_secs(), 120);
    }
}
