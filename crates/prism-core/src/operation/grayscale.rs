use image::DynamicImage;

use super::{Applied, Operation, OperationContext};
use crate::args::ArgMap;
use crate::error::OperationError;
use crate::types::{Image, StepSummary};

/// Converts to single-channel 8-bit luma. Alpha is dropped.
pub struct Grayscale;

impl Operation for Grayscale {
    fn name(&self) -> &'static str {
        "grayscale"
    }

    fn output_prefix(&self) -> Option<&'static str> {
        Some("grayscaled_")
    }

    fn apply(
        &self,
        _ctx: &OperationContext<'_>,
        _args: &ArgMap,
        image: &Image,
    ) -> Result<Applied, OperationError> {
        let gray = image.derive(DynamicImage::ImageLuma8(image.pixels().to_luma8()));

        Ok(Applied::new(
            "Image successfully converted to grayscale",
            StepSummary::Grayscale {
                original_width: image.width(),
                original_height: image.height(),
                original_mode: image.mode(),
            },
        )
        .with_image(gray))
    }
}
