use image::imageops::FilterType;

use super::{Applied, Operation, OperationContext};
use crate::args::ArgMap;
use crate::error::OperationError;
use crate::types::{Image, StepSummary};

const WIDTH_ARG: &str = "target_width";
const HEIGHT_ARG: &str = "target_height";
const INVALID_DIMENSIONS: &str = "Target dimensions must be positive integers.";

/// Resizes to exact target dimensions; aspect ratio is not preserved.
pub struct Resize;

impl Resize {
    fn dimension(args: &ArgMap, name: &str, max: u32) -> Result<u32, OperationError> {
        let value = args.require_int(name, INVALID_DIMENSIONS)?;
        let value = u32::try_from(value)
            .ok()
            .filter(|&v| v > 0)
            .ok_or_else(|| OperationError::invalid(name, INVALID_DIMENSIONS))?;
        if value > max {
            return Err(OperationError::invalid(
                name,
                format!("Target dimensions must not exceed {max} pixels."),
            ));
        }
        Ok(value)
    }

    fn dimensions(ctx: &OperationContext<'_>, args: &ArgMap) -> Result<(u32, u32), OperationError> {
        args.require_all(&[WIDTH_ARG, HEIGHT_ARG])?;
        let max = ctx.limits.max_image_dimension;
        Ok((
            Self::dimension(args, WIDTH_ARG, max)?,
            Self::dimension(args, HEIGHT_ARG, max)?,
        ))
    }
}

impl Operation for Resize {
    fn name(&self) -> &'static str {
        "resize"
    }

    fn output_prefix(&self) -> Option<&'static str> {
        Some("resized_")
    }

    fn validate(&self, ctx: &OperationContext<'_>, args: &ArgMap) -> Result<(), OperationError> {
        Self::dimensions(ctx, args).map(|_| ())
    }

    fn apply(
        &self,
        ctx: &OperationContext<'_>,
        args: &ArgMap,
        image: &Image,
    ) -> Result<Applied, OperationError> {
        let (width, height) = Self::dimensions(ctx, args)?;

        let resized = image.derive(image.pixels().resize_exact(width, height, FilterType::CatmullRom));

        Ok(Applied::new(
            "Image resized successfully.",
            StepSummary::Resize {
                original_width: image.width(),
                original_height: image.height(),
                target_width: width,
                target_height: height,
            },
        )
        .with_image(resized))
    }
}
