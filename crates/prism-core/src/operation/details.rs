use super::{Applied, Operation, OperationContext};
use crate::args::ArgMap;
use crate::error::OperationError;
use crate::types::{format_name, Image, StepSummary};

/// Reports dimensions, color mode, transparency, source format and EXIF.
/// Never produces a new image.
pub struct Details;

impl Operation for Details {
    fn name(&self) -> &'static str {
        "details"
    }

    fn output_prefix(&self) -> Option<&'static str> {
        None
    }

    fn apply(
        &self,
        _ctx: &OperationContext<'_>,
        _args: &ArgMap,
        image: &Image,
    ) -> Result<Applied, OperationError> {
        Ok(Applied::new(
            "Successfully retrieved image details",
            StepSummary::Details {
                width: image.width(),
                height: image.height(),
                mode: image.mode(),
                has_transparency_data: image.has_transparency(),
                format: format_name(image),
                exif: image.exif().cloned(),
            },
        ))
    }
}
