//! Core data types for the Prism transformation pipeline.
//!
//! [`Image`] is the value threaded from step to step. Everything else here
//! describes what a run reports: one [`StepRecord`] per step, gathered into a
//! [`PipelineReport`] (or a [`StandaloneReport`] for direct invocation).

use image::{ColorType, DynamicImage, GenericImageView, ImageFormat};
use serde::{Deserialize, Serialize};

use crate::codec::format_to_string;
use crate::error::{PipelineError, PipelineResult};

/// A decoded image plus the attributes the pipeline reports on.
///
/// The executor owns exactly one `Image` at a time. Handlers borrow it and
/// return a fresh `Image` when they transform it; the old one is dropped.
#[derive(Debug, Clone)]
pub struct Image {
    pixels: DynamicImage,
    /// Encoding the pixels were decoded from; `None` once pixels are derived
    format: Option<ImageFormat>,
    exif: Option<ExifData>,
}

impl Image {
    pub fn new(pixels: DynamicImage) -> Self {
        Self {
            pixels,
            format: None,
            exif: None,
        }
    }

    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_exif(mut self, exif: Option<ExifData>) -> Self {
        self.exif = exif;
        self
    }

    /// A new image built from transformed pixels.
    ///
    /// Metadata travels with the image; the source encoding does not, since
    /// the new pixels were never decoded from it.
    pub fn derive(&self, pixels: DynamicImage) -> Self {
        Self {
            pixels,
            format: None,
            exif: self.exif.clone(),
        }
    }

    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.pixels.dimensions().0
    }

    pub fn height(&self) -> u32 {
        self.pixels.dimensions().1
    }

    pub fn mode(&self) -> ColorMode {
        ColorMode::from(self.pixels.color())
    }

    pub fn has_transparency(&self) -> bool {
        self.pixels.color().has_alpha()
    }

    pub fn format(&self) -> Option<ImageFormat> {
        self.format
    }

    pub fn exif(&self) -> Option<&ExifData> {
        self.exif.as_ref()
    }
}

/// Pixel layout of an image, named the way imaging tools usually print it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorMode {
    #[serde(rename = "L")]
    Luma8,
    #[serde(rename = "LA")]
    LumaA8,
    #[serde(rename = "RGB")]
    Rgb8,
    #[serde(rename = "RGBA")]
    Rgba8,
    #[serde(rename = "L;16")]
    Luma16,
    #[serde(rename = "LA;16")]
    LumaA16,
    #[serde(rename = "RGB;16")]
    Rgb16,
    #[serde(rename = "RGBA;16")]
    Rgba16,
    #[serde(rename = "RGB;F")]
    Rgb32F,
    #[serde(rename = "RGBA;F")]
    Rgba32F,
    #[serde(rename = "unknown")]
    Unknown,
}

impl From<ColorType> for ColorMode {
    fn from(color: ColorType) -> Self {
        match color {
            ColorType::L8 => Self::Luma8,
            ColorType::La8 => Self::LumaA8,
            ColorType::Rgb8 => Self::Rgb8,
            ColorType::Rgba8 => Self::Rgba8,
            ColorType::L16 => Self::Luma16,
            ColorType::La16 => Self::LumaA16,
            ColorType::Rgb16 => Self::Rgb16,
            ColorType::Rgba16 => Self::Rgba16,
            ColorType::Rgb32F => Self::Rgb32F,
            ColorType::Rgba32F => Self::Rgba32F,
            _ => Self::Unknown,
        }
    }
}

/// EXIF metadata carried alongside an image.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ExifData {
    /// When the photo was captured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<String>,

    /// Camera manufacturer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_make: Option<String>,

    /// Camera model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_model: Option<String>,

    /// ISO sensitivity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iso: Option<u32>,

    /// Image orientation (1-8)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<u32>,
}

impl ExifData {
    pub fn is_empty(&self) -> bool {
        self.captured_at.is_none()
            && self.camera_make.is_none()
            && self.camera_model.is_none()
            && self.iso.is_none()
            && self.orientation.is_none()
    }
}

/// Operation-specific fields of a successful step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StepSummary {
    Details {
        width: u32,
        height: u32,
        mode: ColorMode,
        has_transparency_data: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        format: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        exif: Option<ExifData>,
    },
    Rotate {
        rotation_angle: u16,
        original_width: u32,
        original_height: u32,
        width: u32,
        height: u32,
    },
    Resize {
        original_width: u32,
        original_height: u32,
        target_width: u32,
        target_height: u32,
    },
    Grayscale {
        original_width: u32,
        original_height: u32,
        original_mode: ColorMode,
    },
    Brightness {
        brightness_delta: f64,
    },
    Transform {
        target_format: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        compress_quality: Option<u8>,
        preserve_metadata: bool,
        mode: ColorMode,
    },
}

/// Either the success payload or the error of one step. Never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StepOutcome {
    Completed {
        #[serde(rename = "success")]
        message: String,
        #[serde(flatten)]
        summary: StepSummary,
    },
    Failed {
        error: String,
    },
}

/// Archived, image-free result of one attempted pipeline step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    /// Position of the step in the request's operation list
    pub index: usize,

    /// Operation name as it appeared in the request
    pub operation: String,

    #[serde(flatten)]
    pub outcome: StepOutcome,
}

impl StepRecord {
    pub fn completed(
        index: usize,
        operation: impl Into<String>,
        message: impl Into<String>,
        summary: StepSummary,
    ) -> Self {
        Self {
            index,
            operation: operation.into(),
            outcome: StepOutcome::Completed {
                message: message.into(),
                summary,
            },
        }
    }

    pub fn failed(index: usize, operation: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            index,
            operation: operation.into(),
            outcome: StepOutcome::Failed {
                error: error.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, StepOutcome::Completed { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            StepOutcome::Failed { error } => Some(error),
            StepOutcome::Completed { .. } => None,
        }
    }

    pub fn summary(&self) -> Option<&StepSummary> {
        match &self.outcome {
            StepOutcome::Completed { summary, .. } => Some(summary),
            StepOutcome::Failed { .. } => None,
        }
    }
}

/// Terminal artifact of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    #[serde(rename = "success")]
    pub message: String,

    /// Number of entries in the request's operation list
    pub operations_count: usize,

    /// Steps whose handler succeeded
    pub succeeded_count: usize,

    /// Steps whose handler reported an error
    pub failed_count: usize,

    /// Steps that could not be attempted (unknown name, unusable arguments)
    pub skipped_count: usize,

    /// Per-step records in execution order
    pub step_records: Vec<StepRecord>,

    /// Key the final image was written under
    pub output_key: String,

    /// Encoding of the final image
    pub output_format: String,

    /// Time-limited retrieval reference for the final image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_reference: Option<String>,

    pub url_expires_in_seconds: u64,

    /// Wall time of the run, fetch through persist
    pub elapsed_ms: u64,
}

/// Result of a standalone (single-operation) invocation.
#[derive(Debug, Clone, Serialize)]
pub struct StandaloneReport {
    pub operation: String,

    #[serde(rename = "success")]
    pub message: String,

    #[serde(flatten)]
    pub summary: StepSummary,

    /// Key the transformed image was written under; `None` for read-only operations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_reference: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_expires_in_seconds: Option<u64>,
}

/// Wire-level response: a report or a single error message.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Response<T> {
    Success(T),
    Failure { error: String },
}

impl<T> Response<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl<T> From<PipelineResult<T>> for Response<T> {
    fn from(result: PipelineResult<T>) -> Self {
        match result {
            Ok(report) => Self::Success(report),
            Err(e) => Self::from(e),
        }
    }
}

impl<T> From<PipelineError> for Response<T> {
    fn from(error: PipelineError) -> Self {
        Self::Failure {
            error: error.to_string(),
        }
    }
}

/// Response of a pipeline run.
pub type PipelineResponse = Response<PipelineReport>;

/// Display name of an image's source encoding, if it still has one.
pub(crate) fn format_name(image: &Image) -> Option<String> {
    image.format().map(format_to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_mode_names() {
        assert_eq!(serde_json::to_string(&ColorMode::Luma8).unwrap(), "\"L\"");
        assert_eq!(serde_json::to_string(&ColorMode::Rgba8).unwrap(), "\"RGBA\"");
        assert_eq!(ColorMode::from(ColorType::Rgb8), ColorMode::Rgb8);
    }

    #[test]
    fn test_image_derive_keeps_exif_drops_format() {
        let exif = ExifData {
            camera_make: Some("Fujifilm".into()),
            ..Default::default()
        };
        let source = Image::new(DynamicImage::new_rgb8(4, 2))
            .with_format(ImageFormat::Jpeg)
            .with_exif(Some(exif.clone()));
        let derived = source.derive(DynamicImage::new_rgb8(2, 4));

        assert_eq!(derived.width(), 2);
        assert_eq!(derived.height(), 4);
        assert_eq!(derived.format(), None);
        assert_eq!(derived.exif(), Some(&exif));
    }

    #[test]
    fn test_image_transparency() {
        assert!(Image::new(DynamicImage::new_rgba8(1, 1)).has_transparency());
        assert!(!Image::new(DynamicImage::new_rgb8(1, 1)).has_transparency());
    }

    #[test]
    fn test_completed_record_serializes_flat() {
        let record = StepRecord::completed(
            0,
            "resize",
            "Image resized successfully.",
            StepSummary::Resize {
                original_width: 100,
                original_height: 50,
                target_width: 10,
                target_height: 5,
            },
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["index"], 0);
        assert_eq!(json["operation"], "resize");
        assert_eq!(json["success"], "Image resized successfully.");
        assert_eq!(json["original_width"], 100);
        assert_eq!(json["target_height"], 5);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_failed_record_has_only_error() {
        let record = StepRecord::failed(3, "rotate", "Invalid rotation angle.");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["error"], "Invalid rotation angle.");
        assert!(json.get("success").is_none());
        assert!(!record.is_success());
        assert_eq!(record.error(), Some("Invalid rotation angle."));
        assert!(record.summary().is_none());
    }

    #[test]
    fn test_details_exif_omitted_when_absent() {
        let summary = StepSummary::Details {
            width: 1,
            height: 1,
            mode: ColorMode::Rgb8,
            has_transparency_data: false,
            format: None,
            exif: None,
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(!json.contains("exif"));
        assert!(!json.contains("format"));
    }

    #[test]
    fn test_failure_response_shape() {
        let response: PipelineResponse =
            PipelineError::InvalidRequest("Missing request parameters: operations".into()).into();
        assert!(!response.is_success());
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json, serde_json::json!({"error": "Missing request parameters: operations"}));
    }
}
