//! Direct invocation of a single operation.
//!
//! Fetches the source, applies one handler, and (for handlers that produce an
//! image) writes exactly one object:
//!
//! | operation    | output key                  |
//! |--------------|-----------------------------|
//! | `rotate`     | `rotated_<key>`             |
//! | `resize`     | `resized_<key>`             |
//! | `grayscale`  | `grayscaled_<key>`          |
//! | `brightness` | `brightness_<key>`          |
//! | `transform`  | `transformed_<stem>.<ext>`  |
//! | `details`    | nothing written             |

use serde_json::Value;

use super::{derive_key, OperationContext, Registry};
use crate::args::{ArgMap, ArgValue};
use crate::codec::{Encoding, EncodingFormat};
use crate::config::Config;
use crate::error::{OperationError, PipelineError, PipelineResult};
use crate::pipeline::request::{as_object, missing_fields, text_field};
use crate::store::ImageRepository;
use crate::types::{Image, StandaloneReport};

const BUCKET_FIELDS: &[&str] = &["bucket_id", "bucketname"];
const KEY_FIELDS: &[&str] = &["object_id", "filename"];
const DOWNLOAD_FIELD: &str = "get_download";

/// A single-operation request.
#[derive(Debug, Clone, PartialEq)]
pub struct StandaloneRequest {
    pub operation: String,
    pub bucket: String,
    pub key: String,
    pub args: ArgMap,
    /// Include a retrieval reference for the written object
    pub get_download: bool,
}

impl StandaloneRequest {
    pub fn new(operation: impl Into<String>, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            bucket: bucket.into(),
            key: key.into(),
            args: ArgMap::new(),
            get_download: false,
        }
    }

    pub fn with_args(mut self, args: ArgMap) -> Self {
        self.args = args;
        self
    }

    pub fn with_download(mut self, get_download: bool) -> Self {
        self.get_download = get_download;
        self
    }

    /// Parse a flat JSON request: location fields plus the operation's own
    /// arguments side by side.
    pub fn from_json(operation: &str, value: &Value) -> PipelineResult<Self> {
        let object = as_object(value)?;
        let bucket = text_field(object, BUCKET_FIELDS);
        let key = text_field(object, KEY_FIELDS);
        let (Some(bucket), Some(key)) = (bucket.clone(), key.clone()) else {
            let mut missing = Vec::new();
            if bucket.is_none() {
                missing.push(BUCKET_FIELDS[0]);
            }
            if key.is_none() {
                missing.push(KEY_FIELDS[0]);
            }
            return Err(missing_fields(&missing));
        };

        let mut args = ArgMap::new();
        let mut get_download = false;
        for (name, value) in object {
            if BUCKET_FIELDS.contains(&name.as_str()) || KEY_FIELDS.contains(&name.as_str()) {
                continue;
            }
            let value = ArgValue::from(value.clone());
            if name == DOWNLOAD_FIELD {
                get_download = value.as_bool().unwrap_or(false);
            } else {
                args.insert(name.clone(), value);
            }
        }

        Ok(Self {
            operation: operation.to_string(),
            bucket,
            key,
            args,
            get_download,
        })
    }
}

/// Run one operation against a stored image.
///
/// Arguments are checked before anything is fetched. Unlike in a pipeline,
/// a handler failure fails the whole invocation.
pub fn run_standalone(
    repository: &ImageRepository,
    config: &Config,
    request: &StandaloneRequest,
) -> PipelineResult<StandaloneReport> {
    let op = Registry::global()
        .resolve(&request.operation)
        .ok_or_else(|| PipelineError::UnknownOperation(request.operation.clone()))?;
    let operation_error = |source: OperationError| PipelineError::Operation {
        operation: request.operation.clone(),
        source,
    };

    let ctx = OperationContext {
        bucket: &request.bucket,
        key: &request.key,
        transform: &config.transform,
        limits: &config.limits,
    };
    op.validate(&ctx, &request.args).map_err(operation_error)?;

    let source = repository.fetch_image(&request.bucket, &request.key)?;
    let applied = op.apply(&ctx, &request.args, &source).map_err(operation_error)?;

    let mut report = StandaloneReport {
        operation: request.operation.clone(),
        message: applied.message.to_string(),
        summary: applied.summary,
        output_key: None,
        output_reference: None,
        url_expires_in_seconds: None,
    };

    let (Some(prefix), Some(image)) = (op.output_prefix(), applied.image) else {
        return Ok(report);
    };

    let (output_key, encoding) = match applied.encoding {
        Some(encoding) => (
            derive_key(&request.key, prefix, Some(encoding.format.extension())),
            encoding,
        ),
        None => keep_source_encoding(&request.key, prefix, &source, config.default_output_format()),
    };
    repository.store_image(&request.bucket, &output_key, &image, encoding)?;
    tracing::info!("{} wrote {}/{}", request.operation, request.bucket, output_key);

    if request.get_download {
        match repository.get_retrieval_reference(&request.bucket, &output_key) {
            Ok(reference) => {
                report.output_reference = Some(reference);
                report.url_expires_in_seconds = Some(repository.url_expiry().as_secs());
            }
            Err(e) => {
                tracing::warn!("No retrieval reference for {}/{}: {}", request.bucket, output_key, e)
            }
        }
    }
    report.output_key = Some(output_key);
    Ok(report)
}

/// Output key and encoding for handlers that do not choose a format.
///
/// The source key's extension wins when it names a supported format, then
/// the source's decoded format; otherwise the default is used and the key's
/// extension is replaced to match.
fn keep_source_encoding(
    key: &str,
    prefix: &str,
    source: &Image,
    default: EncodingFormat,
) -> (String, Encoding) {
    let from_key = key
        .rsplit_once('.')
        .and_then(|(_, ext)| EncodingFormat::parse(ext));
    if let Some(format) = from_key {
        return (derive_key(key, prefix, None), Encoding::new(format));
    }
    let format = source
        .format()
        .and_then(EncodingFormat::from_image_format)
        .unwrap_or(default);
    (
        derive_key(key, prefix, Some(format.extension())),
        Encoding::new(format),
    )
}
