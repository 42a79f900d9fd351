//! Operation handlers and the registry that names them.
//!
//! Every handler implements [`Operation`]: validate its own arguments, do one
//! piece of imaging work on a borrowed [`Image`], and return an [`Applied`]
//! describing the result. Handlers never touch storage. The two callers
//! decide what happens with the output:
//!
//! - the pipeline executor threads [`Applied::image`] into the next step
//! - [`standalone::run_standalone`] persists it under a derived key

mod brightness;
mod details;
mod grayscale;
mod registry;
mod resize;
mod rotate;
pub mod standalone;
mod transform;

pub use brightness::Brightness;
pub use details::Details;
pub use grayscale::Grayscale;
pub use registry::Registry;
pub use resize::Resize;
pub use rotate::Rotate;
pub use standalone::run_standalone;
pub use transform::Transform;

use crate::args::ArgMap;
use crate::codec::Encoding;
use crate::config::{LimitsConfig, TransformConfig};
use crate::error::OperationError;
use crate::types::{Image, StepSummary};

/// Request-scoped values handed to every handler alongside its arguments.
#[derive(Debug, Clone, Copy)]
pub struct OperationContext<'a> {
    /// Bucket the source image was fetched from
    pub bucket: &'a str,
    /// Key of the source image
    pub key: &'a str,
    /// Defaults for `transform` arguments
    pub transform: &'a TransformConfig,
    /// Bounds on images a handler may produce
    pub limits: &'a LimitsConfig,
}

/// Successful result of one handler call.
#[derive(Debug)]
pub struct Applied {
    pub message: &'static str,
    pub summary: StepSummary,
    /// Replacement image; `None` means the input carries forward unchanged
    pub image: Option<Image>,
    /// Encoding the handler committed the image to, if it chose one
    pub encoding: Option<Encoding>,
}

impl Applied {
    pub fn new(message: &'static str, summary: StepSummary) -> Self {
        Self {
            message,
            summary,
            image: None,
            encoding: None,
        }
    }

    pub fn with_image(mut self, image: Image) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }
}

/// One named transformation.
pub trait Operation: Send + Sync {
    /// Name used in requests; matched exactly.
    fn name(&self) -> &'static str;

    /// Prefix of the key a standalone invocation writes to, or `None` for
    /// read-only operations.
    fn output_prefix(&self) -> Option<&'static str>;

    /// Check arguments without touching an image.
    ///
    /// Lets a standalone invocation reject bad arguments before fetching
    /// anything. `apply` repeats the same checks.
    fn validate(&self, _ctx: &OperationContext<'_>, _args: &ArgMap) -> Result<(), OperationError> {
        Ok(())
    }

    /// Apply the operation to `image`.
    ///
    /// Argument problems and imaging failures are returned as errors; the
    /// input image is never modified.
    fn apply(
        &self,
        ctx: &OperationContext<'_>,
        args: &ArgMap,
        image: &Image,
    ) -> Result<Applied, OperationError>;
}

/// Derive an output key from a source key.
///
/// The prefix goes on the file name, not the directory, so
/// `albums/cat.jpg` becomes `albums/batch_cat.png`. With no `extension` the
/// original file name is kept whole.
pub fn derive_key(source_key: &str, prefix: &str, extension: Option<&str>) -> String {
    let (dir, file) = match source_key.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, source_key),
    };
    let file = match extension {
        Some(ext) => {
            let stem = match file.rsplit_once('.') {
                Some((stem, _)) if !stem.is_empty() => stem,
                _ => file,
            };
            format!("{prefix}{stem}.{ext}")
        }
        None => format!("{prefix}{file}"),
    };
    match dir {
        Some(dir) => format!("{dir}/{file}"),
        None => file,
    }
}
