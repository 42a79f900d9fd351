use super::{Applied, Operation, OperationContext};
use crate::args::ArgMap;
use crate::error::OperationError;
use crate::types::{Image, StepSummary};

const ANGLE_ARG: &str = "rotation_angle";
const INVALID_ANGLE: &str = "Invalid rotation angle. Only 90, 180, or 270 degrees are supported.";

/// Rotates counter-clockwise by a right angle, expanding the canvas so
/// 90 and 270 swap width and height.
pub struct Rotate;

impl Rotate {
    fn angle(args: &ArgMap) -> Result<u16, OperationError> {
        match args.require_int(ANGLE_ARG, INVALID_ANGLE)? {
            90 => Ok(90),
            180 => Ok(180),
            270 => Ok(270),
            _ => Err(OperationError::invalid(ANGLE_ARG, INVALID_ANGLE)),
        }
    }
}

impl Operation for Rotate {
    fn name(&self) -> &'static str {
        "rotate"
    }

    fn output_prefix(&self) -> Option<&'static str> {
        Some("rotated_")
    }

    fn validate(&self, _ctx: &OperationContext<'_>, args: &ArgMap) -> Result<(), OperationError> {
        Self::angle(args).map(|_| ())
    }

    fn apply(
        &self,
        _ctx: &OperationContext<'_>,
        args: &ArgMap,
        image: &Image,
    ) -> Result<Applied, OperationError> {
        let angle = Self::angle(args)?;

        // image's rotate* helpers turn clockwise
        let pixels = match angle {
            90 => image.pixels().rotate270(),
            180 => image.pixels().rotate180(),
            _ => image.pixels().rotate90(),
        };
        let rotated = image.derive(pixels);

        Ok(Applied::new(
            "Image rotated successfully",
            StepSummary::Rotate {
                rotation_angle: angle,
                original_width: image.width(),
                original_height: image.height(),
                width: rotated.width(),
                height: rotated.height(),
            },
        )
        .with_image(rotated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::test_support::*;
    use image::GenericImageView;

    fn rotate(angle: serde_json::Value) -> Result<Applied, OperationError> {
        let defaults = transform_defaults();
        let args = ArgMap::new().with(ANGLE_ARG, angle);
        Rotate.apply(&ctx(&defaults), &args, &rgba_image(40, 10))
    }

    #[test]
    fn test_quarter_turns_swap_dimensions() {
        for angle in [90, 270] {
            let applied = rotate(angle.into()).unwrap();
            let image = applied.image.unwrap();
            assert_eq!((image.width(), image.height()), (10, 40));
        }
    }

    #[test]
    fn test_half_turn_keeps_dimensions() {
        let image = rotate(180.into()).unwrap().image.unwrap();
        assert_eq!((image.width(), image.height()), (40, 10));
    }

    #[test]
    fn test_rotation_is_counter_clockwise() {
        let defaults = transform_defaults();
        let source = rgba_image(40, 10);
        let args = ArgMap::new().with(ANGLE_ARG, 90);
        let rotated = Rotate.apply(&ctx(&defaults), &args, &source).unwrap().image.unwrap();

        // The top-right source pixel ends up top-left
        let top_right = source.pixels().get_pixel(39, 0);
        assert_eq!(rotated.pixels().get_pixel(0, 0), top_right);
    }

    #[test]
    fn test_angle_as_text_is_accepted() {
        assert!(rotate("90".into()).is_ok());
    }

    #[test]
    fn test_invalid_angles_rejected() {
        for angle in [0, -90, 45, 360, 999] {
            let err = rotate(angle.into()).unwrap_err();
            assert_eq!(err.to_string(), INVALID_ANGLE);
            assert!(err.is_argument_error());
        }
        assert!(rotate("sideways".into()).is_err());
        assert!(rotate(90.5.into()).is_err());
    }

    #[test]
    fn test_missing_angle() {
        let defaults = transform_defaults();
        let err = Rotate
            .apply(&ctx(&defaults), &ArgMap::new(), &rgba_image(4, 4))
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing request parameters: rotation_angle");
    }

    #[test]
    fn test_summary_fields() {
        match rotate(270.into()).unwrap().summary {
            StepSummary::Rotate {
                rotation_angle,
                original_width,
                original_height,
                width,
                height,
            } => {
                assert_eq!(rotation_angle, 270);
                assert_eq!((original_width, original_height), (40, 10));
                assert_eq!((width, height), (10, 40));
            }
            other => panic!("unexpected summary {other:?}"),
        }
    }
}
