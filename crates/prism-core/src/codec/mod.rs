//! Image decoding and encoding.
//!
//! Everything that turns bytes into an [`Image`] or an [`Image`] back into
//! bytes lives here:
//! - **validate**: magic-byte sniffing before a full decode
//! - **metadata**: EXIF extraction from the encoded container
//! - [`ImageCodec`]: size/dimension limits plus the actual decode
//! - [`encode`]: pixel-format preparation and encoding for each [`EncodingFormat`]

mod metadata;
mod validate;

pub use metadata::extract_exif;
pub use validate::is_valid_image_header;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageResult};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::io::Cursor;

use crate::config::LimitsConfig;
use crate::error::PipelineError;
use crate::types::Image;

/// Output encodings accepted by `transform` and by the final persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EncodingFormat {
    Jpeg,
    Png,
    Bmp,
    Gif,
    Tiff,
}

impl EncodingFormat {
    /// Every supported output encoding, in display order.
    pub const ALL: [EncodingFormat; 5] = [
        EncodingFormat::Jpeg,
        EncodingFormat::Png,
        EncodingFormat::Bmp,
        EncodingFormat::Gif,
        EncodingFormat::Tiff,
    ];

    /// Parse a format name (case-insensitive, surrounding whitespace ignored).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "JPEG" | "JPG" => Some(Self::Jpeg),
            "PNG" => Some(Self::Png),
            "BMP" => Some(Self::Bmp),
            "GIF" => Some(Self::Gif),
            "TIFF" | "TIF" => Some(Self::Tiff),
            _ => None,
        }
    }

    /// Canonical upper-case name ("JPEG", "PNG", ...).
    pub fn name(self) -> &'static str {
        match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::Bmp => "BMP",
            Self::Gif => "GIF",
            Self::Tiff => "TIFF",
        }
    }

    /// File extension used for derived object keys.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Bmp => "bmp",
            Self::Gif => "gif",
            Self::Tiff => "tiff",
        }
    }

    /// MIME type for stores that record one.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Bmp => "image/bmp",
            Self::Gif => "image/gif",
            Self::Tiff => "image/tiff",
        }
    }

    /// The supported output format matching a decoded image's format.
    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.image_format() == format)
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
            Self::Bmp => ImageFormat::Bmp,
            Self::Gif => ImageFormat::Gif,
            Self::Tiff => ImageFormat::Tiff,
        }
    }

    /// Comma-separated list of supported names, for error messages.
    pub fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|f| f.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for EncodingFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An output format together with its compression quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Encoding {
    pub format: EncodingFormat,
    /// JPEG quality in [1,100]; `None` leaves the encoder default
    pub quality: Option<u8>,
}

impl Encoding {
    pub fn new(format: EncodingFormat) -> Self {
        Self {
            format,
            quality: None,
        }
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality);
        self
    }
}

/// Convert an ImageFormat to its display name.
pub fn format_to_string(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "JPEG".to_string(),
        ImageFormat::Png => "PNG".to_string(),
        ImageFormat::WebP => "WEBP".to_string(),
        ImageFormat::Gif => "GIF".to_string(),
        ImageFormat::Tiff => "TIFF".to_string(),
        ImageFormat::Bmp => "BMP".to_string(),
        _ => "UNKNOWN".to_string(),
    }
}

/// Image decoder with configurable limits.
#[derive(Debug, Clone, Default)]
pub struct ImageCodec {
    limits: LimitsConfig,
}

impl ImageCodec {
    /// Create a new codec with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Decode an encoded object into an [`Image`].
    ///
    /// Checks the size limit and magic bytes before decoding and the
    /// dimension limit after. The format is detected from content, so a PNG
    /// stored under a `.jpg` key still decodes as PNG.
    pub fn decode(&self, bytes: &[u8], key: &str) -> Result<Image, PipelineError> {
        let max_bytes = self.limits.max_file_size_mb * 1024 * 1024;
        if bytes.len() as u64 > max_bytes {
            return Err(PipelineError::FileTooLarge {
                key: key.to_string(),
                size_mb: bytes.len() as u64 / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }

        if bytes.len() < 4 {
            return Err(PipelineError::Decode {
                key: key.to_string(),
                message: "File too small to be a valid image".to_string(),
            });
        }
        if !is_valid_image_header(&bytes[..bytes.len().min(12)]) {
            return Err(PipelineError::Decode {
                key: key.to_string(),
                message: "Unrecognized image format (invalid magic bytes)".to_string(),
            });
        }

        let reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| PipelineError::Decode {
                key: key.to_string(),
                message: format!("Cannot detect image format: {}", e),
            })?;
        let format = reader.format();
        let pixels = reader.decode().map_err(|e| PipelineError::Decode {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        let (width, height) = pixels.dimensions();
        if width > self.limits.max_image_dimension || height > self.limits.max_image_dimension {
            return Err(PipelineError::ImageTooLarge {
                key: key.to_string(),
                width,
                height,
                max_dim: self.limits.max_image_dimension,
            });
        }

        let mut image = Image::new(pixels).with_exif(extract_exif(bytes));
        if let Some(format) = format {
            image = image.with_format(format);
        }
        Ok(image)
    }
}

/// Encode pixels in the given format.
///
/// `quality` only affects JPEG; `None` uses the encoder default.
pub fn encode(
    pixels: &DynamicImage,
    format: EncodingFormat,
    quality: Option<u8>,
) -> ImageResult<Vec<u8>> {
    let prepared = prepare_for_encoding(pixels, format);
    let mut buffer = Vec::new();
    match (format, quality) {
        (EncodingFormat::Jpeg, Some(quality)) => {
            let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
            prepared.write_with_encoder(encoder)?;
        }
        _ => {
            prepared.write_to(&mut Cursor::new(&mut buffer), format.image_format())?;
        }
    }
    Ok(buffer)
}

/// Decode bytes produced by [`encode`], trusting the known format.
pub fn decode_encoded(bytes: &[u8], format: EncodingFormat) -> ImageResult<DynamicImage> {
    image::load_from_memory_with_format(bytes, format.image_format())
}

/// Convert pixels into a layout the target encoder accepts.
///
/// JPEG has no alpha channel and GIF is palette-based from RGBA, so both are
/// normalized; the other encoders only need float data narrowed to 8-bit.
fn prepare_for_encoding(pixels: &DynamicImage, format: EncodingFormat) -> Cow<'_, DynamicImage> {
    match format {
        EncodingFormat::Jpeg => match pixels {
            DynamicImage::ImageRgb8(_) => Cow::Borrowed(pixels),
            other => Cow::Owned(DynamicImage::ImageRgb8(other.to_rgb8())),
        },
        EncodingFormat::Gif => match pixels {
            DynamicImage::ImageRgba8(_) => Cow::Borrowed(pixels),
            other => Cow::Owned(DynamicImage::ImageRgba8(other.to_rgba8())),
        },
        EncodingFormat::Bmp => match pixels {
            DynamicImage::ImageLuma8(_)
            | DynamicImage::ImageLumaA8(_)
            | DynamicImage::ImageRgb8(_)
            | DynamicImage::ImageRgba8(_) => Cow::Borrowed(pixels),
            other if other.color().has_alpha() => {
                Cow::Owned(DynamicImage::ImageRgba8(other.to_rgba8()))
            }
            other => Cow::Owned(DynamicImage::ImageRgb8(other.to_rgb8())),
        },
        EncodingFormat::Png => match pixels {
            DynamicImage::ImageRgb32F(_) => Cow::Owned(DynamicImage::ImageRgb8(pixels.to_rgb8())),
            DynamicImage::ImageRgba32F(_) => {
                Cow::Owned(DynamicImage::ImageRgba8(pixels.to_rgba8()))
            }
            _ => Cow::Borrowed(pixels),
        },
        // The TIFF encoder has no luma+alpha layouts.
        EncodingFormat::Tiff => match pixels {
            DynamicImage::ImageLumaA8(_)
            | DynamicImage::ImageLumaA16(_)
            | DynamicImage::ImageRgba32F(_) => {
                Cow::Owned(DynamicImage::ImageRgba8(pixels.to_rgba8()))
            }
            DynamicImage::ImageRgb32F(_) => Cow::Owned(DynamicImage::ImageRgb8(pixels.to_rgb8())),
            _ => Cow::Borrowed(pixels),
        },
    }
}
