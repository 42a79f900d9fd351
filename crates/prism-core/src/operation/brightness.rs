use image::{DynamicImage, ImageBuffer, Pixel, Primitive};
use num_traits::{NumCast, ToPrimitive};

use super::{Applied, Operation, OperationContext};
use crate::args::ArgMap;
use crate::error::OperationError;
use crate::types::{Image, StepSummary};

const FACTOR_ARG: &str = "brightness_delta";
const MIN_FACTOR: f64 = 0.0;
const MAX_FACTOR: f64 = 100.0;

/// Scales color channels by a factor in [0, 100].
///
/// 0 gives black, 1 is the identity, larger values brighten and saturate.
/// Alpha is left alone.
pub struct Brightness;

impl Brightness {
    fn factor(args: &ArgMap) -> Result<f64, OperationError> {
        let factor = args.require_float(
            FACTOR_ARG,
            &format!("'{FACTOR_ARG}' is not parsable as a float."),
        )?;
        if !(MIN_FACTOR..=MAX_FACTOR).contains(&factor) {
            return Err(OperationError::invalid(
                FACTOR_ARG,
                format!("'{FACTOR_ARG}' is out-of-bounds ({MIN_FACTOR}-{MAX_FACTOR}): {factor}"),
            ));
        }
        Ok(factor)
    }
}

impl Operation for Brightness {
    fn name(&self) -> &'static str {
        "brightness"
    }

    fn output_prefix(&self) -> Option<&'static str> {
        Some("brightness_")
    }

    fn validate(&self, _ctx: &OperationContext<'_>, args: &ArgMap) -> Result<(), OperationError> {
        Self::factor(args).map(|_| ())
    }

    fn apply(
        &self,
        _ctx: &OperationContext<'_>,
        args: &ArgMap,
        image: &Image,
    ) -> Result<Applied, OperationError> {
        let factor = Self::factor(args)?;
        let adjusted = image.derive(scale_brightness(image.pixels(), factor as f32));

        Ok(Applied::new(
            "Successfully changed image brightness.",
            StepSummary::Brightness {
                brightness_delta: factor,
            },
        )
        .with_image(adjusted))
    }
}

fn scale_brightness(pixels: &DynamicImage, factor: f32) -> DynamicImage {
    match pixels {
        DynamicImage::ImageLuma8(buf) => DynamicImage::ImageLuma8(scale_buffer(buf, factor)),
        DynamicImage::ImageLumaA8(buf) => DynamicImage::ImageLumaA8(scale_buffer(buf, factor)),
        DynamicImage::ImageRgb8(buf) => DynamicImage::ImageRgb8(scale_buffer(buf, factor)),
        DynamicImage::ImageRgba8(buf) => DynamicImage::ImageRgba8(scale_buffer(buf, factor)),
        DynamicImage::ImageLuma16(buf) => DynamicImage::ImageLuma16(scale_buffer(buf, factor)),
        DynamicImage::ImageLumaA16(buf) => DynamicImage::ImageLumaA16(scale_buffer(buf, factor)),
        DynamicImage::ImageRgb16(buf) => DynamicImage::ImageRgb16(scale_buffer(buf, factor)),
        DynamicImage::ImageRgba16(buf) => DynamicImage::ImageRgba16(scale_buffer(buf, factor)),
        DynamicImage::ImageRgb32F(buf) => DynamicImage::ImageRgb32F(scale_buffer(buf, factor)),
        DynamicImage::ImageRgba32F(buf) => DynamicImage::ImageRgba32F(scale_buffer(buf, factor)),
        other => DynamicImage::ImageRgba8(scale_buffer(&other.to_rgba8(), factor)),
    }
}

type Buffer<P> = ImageBuffer<P, Vec<<P as Pixel>::Subpixel>>;

fn scale_buffer<P: Pixel>(buf: &Buffer<P>, factor: f32) -> Buffer<P> {
    let max = P::Subpixel::DEFAULT_MAX_VALUE.to_f32().unwrap_or(f32::MAX);
    let mut out = buf.clone();
    for pixel in out.pixels_mut() {
        pixel.apply_without_alpha(|channel| {
            let scaled = channel.to_f32().unwrap_or(0.0) * factor;
            NumCast::from(scaled.clamp(0.0, max)).unwrap_or(channel)
        });
    }
    out
}
