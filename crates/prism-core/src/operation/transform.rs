use super::{Applied, Operation, OperationContext};
use crate::args::ArgMap;
use crate::codec::{self, Encoding, EncodingFormat};
use crate::error::OperationError;
use crate::types::{Image, StepSummary};

const FORMAT_ARGS: &[&str] = &["target_format", "output_format"];
const QUALITY_ARGS: &[&str] = &["compress_quality", "quality"];
const METADATA_ARGS: &[&str] = &["preserve_metadata"];

/// Re-encodes into another format and quality.
///
/// The encoded bytes are decoded again so the next step sees what was
/// actually written (JPEG output comes back as RGB with compression
/// artifacts, not as the pre-encode pixels).
pub struct Transform;

impl Transform {
    fn target_format(ctx: &OperationContext<'_>, args: &ArgMap) -> Result<EncodingFormat, OperationError> {
        let requested = args
            .optional_text(FORMAT_ARGS)
            .unwrap_or_else(|| ctx.transform.default_format.clone());
        EncodingFormat::parse(&requested).ok_or_else(|| {
            OperationError::invalid(
                FORMAT_ARGS[0],
                format!(
                    "Unsupported output format: {}. Supported formats: {}",
                    requested.trim().to_uppercase(),
                    EncodingFormat::supported_list()
                ),
            )
        })
    }

    fn quality(ctx: &OperationContext<'_>, args: &ArgMap) -> Result<u8, OperationError> {
        let quality = args
            .optional_int(QUALITY_ARGS)?
            .unwrap_or(i64::from(ctx.transform.default_quality));
        u8::try_from(quality)
            .ok()
            .filter(|q| (1..=100).contains(q))
            .ok_or_else(|| {
                OperationError::invalid(
                    QUALITY_ARGS[0],
                    format!("'{}' is out-of-bounds (1-100): {quality}", QUALITY_ARGS[0]),
                )
            })
    }

    fn encoding(ctx: &OperationContext<'_>, args: &ArgMap) -> Result<(Encoding, bool), OperationError> {
        let format = Self::target_format(ctx, args)?;
        let quality = Self::quality(ctx, args)?;
        let preserve_metadata = args.optional_bool(METADATA_ARGS)?.unwrap_or(true);
        let encoding = match format {
            EncodingFormat::Jpeg => Encoding::new(format).with_quality(quality),
            _ => Encoding::new(format),
        };
        Ok((encoding, preserve_metadata))
    }
}

impl Operation for Transform {
    fn name(&self) -> &'static str {
        "transform"
    }

    fn output_prefix(&self) -> Option<&'static str> {
        Some("transformed_")
    }

    fn validate(&self, ctx: &OperationContext<'_>, args: &ArgMap) -> Result<(), OperationError> {
        Self::encoding(ctx, args).map(|_| ())
    }

    fn apply(
        &self,
        ctx: &OperationContext<'_>,
        args: &ArgMap,
        image: &Image,
    ) -> Result<Applied, OperationError> {
        let (encoding, preserve_metadata) = Self::encoding(ctx, args)?;
        let format = encoding.format;

        let bytes = codec::encode(image.pixels(), encoding.format, encoding.quality)
            .map_err(|e| OperationError::Processing(format!("Error finalizing image: {e}")))?;
        let pixels = codec::decode_encoded(&bytes, format)
            .map_err(|e| OperationError::Processing(format!("Error finalizing image: {e}")))?;

        let exif = if preserve_metadata {
            image.exif().cloned()
        } else {
            None
        };
        let transformed = Image::new(pixels)
            .with_format(format.image_format())
            .with_exif(exif);

        Ok(Applied::new(
            "Successfully transformed image.",
            StepSummary::Transform {
                target_format: format.name().to_string(),
                compress_quality: encoding.quality,
                preserve_metadata,
                mode: transformed.mode(),
            },
        )
        .with_image(transformed)
        .with_encoding(encoding))
    }
}
