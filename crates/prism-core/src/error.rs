//! Error types for the Prism transformation pipeline.
//!
//! Errors are split by how far they reach:
//!
//! - [`PipelineError`] is fatal to a whole run (bad request, source fetch,
//!   final persist) and becomes the single top-level error message.
//! - [`OperationError`] is recoverable: it ends up inside one step record and
//!   the run continues.
//! - [`StoreError`] comes from the object-store collaborator and is wrapped
//!   by whichever of the above observed it.

use thiserror::Error;

/// Top-level error type for Prism operations.
#[derive(Error, Debug)]
pub enum PrismError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors that abort a whole pipeline run or standalone invocation.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Required request fields are missing or malformed
    #[error("{0}")]
    InvalidRequest(String),

    /// The source object could not be retrieved
    #[error("Could not access image {bucket}/{key}: {source}")]
    Fetch {
        bucket: String,
        key: String,
        #[source]
        source: StoreError,
    },

    /// The source object is not a decodable image
    #[error("Decode error for {key}: {message}")]
    Decode { key: String, message: String },

    /// Source object exceeds the configured size limit
    #[error("File too large: {key} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        key: String,
        size_mb: u64,
        max_mb: u64,
    },

    /// Image dimensions exceed the configured limit
    #[error("Image too large: {key} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        key: String,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// The final image could not be encoded or written
    #[error("Could not write image {bucket}/{key}: {message}")]
    Persist {
        bucket: String,
        key: String,
        message: String,
    },

    /// Standalone invocation of an operation that is not registered
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// Standalone invocation whose handler reported a failure
    #[error("{operation} failed: {source}")]
    Operation {
        operation: String,
        #[source]
        source: OperationError,
    },
}

/// Recoverable failure of a single operation handler.
///
/// Never escapes a pipeline run; the executor archives the message in the
/// step record and carries the current image forward.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OperationError {
    /// A required argument is absent
    #[error("Missing request parameters: {0}")]
    MissingArgument(String),

    /// An argument is present but unusable; the message names it
    #[error("{message}")]
    InvalidArgument { name: String, message: String },

    /// The imaging work itself failed (e.g. encoder error)
    #[error("{0}")]
    Processing(String),
}

impl OperationError {
    pub fn invalid(name: &str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.to_string(),
            message: message.into(),
        }
    }

    /// True for argument problems, as opposed to processing failures.
    pub fn is_argument_error(&self) -> bool {
        matches!(self, Self::MissingArgument(_) | Self::InvalidArgument { .. })
    }
}

/// Errors reported by an object store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No object under this key
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// Bucket or key is not acceptable to the store
    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    /// Filesystem failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other backend failure
    #[error("Store error: {0}")]
    Backend(String),
}

/// Convenience type alias for Prism results.
pub type Result<T> = std::result::Result<T, PrismError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
