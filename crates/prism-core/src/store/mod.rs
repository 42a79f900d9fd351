//! Object storage for source and output images.
//!
//! [`ObjectStore`] is the raw blob interface (bytes by bucket and key).
//! [`ImageRepository`] layers the codec on top, so the engine only ever sees
//! decoded [`Image`]s going in and out.

mod local;
mod memory;

pub use local::LocalObjectStore;
pub use memory::MemoryObjectStore;

use std::sync::Arc;
use std::time::Duration;

use crate::codec::{self, Encoding, ImageCodec};
use crate::error::{PipelineError, PipelineResult, StoreError};
use crate::types::Image;

/// Default lifetime of a retrieval reference.
pub const DEFAULT_URL_EXPIRY: Duration = Duration::from_secs(3600);

/// Blob storage addressed by bucket and key.
///
/// Calls are blocking. Implementations must be shareable across threads so
/// independent pipeline runs can use one store concurrently.
pub trait ObjectStore: Send + Sync {
    /// Read the object under `bucket`/`key`.
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Write (or overwrite) the object under `bucket`/`key`.
    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError>;

    /// A reference that grants read access to the object for `expires_in`.
    fn retrieval_reference(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, StoreError>;
}

/// Fetches, stores and links images through an [`ObjectStore`].
#[derive(Clone)]
pub struct ImageRepository {
    store: Arc<dyn ObjectStore>,
    codec: ImageCodec,
    url_expiry: Duration,
}

impl ImageRepository {
    pub fn new(store: Arc<dyn ObjectStore>, codec: ImageCodec) -> Self {
        Self {
            store,
            codec,
            url_expiry: DEFAULT_URL_EXPIRY,
        }
    }

    pub fn with_url_expiry(mut self, expiry: Duration) -> Self {
        self.url_expiry = expiry;
        self
    }

    pub fn url_expiry(&self) -> Duration {
        self.url_expiry
    }

    /// Retrieve and decode an image.
    pub fn fetch_image(&self, bucket: &str, key: &str) -> PipelineResult<Image> {
        let bytes = self
            .store
            .get_object(bucket, key)
            .map_err(|source| PipelineError::Fetch {
                bucket: bucket.to_string(),
                key: key.to_string(),
                source,
            })?;
        tracing::debug!(bucket, key, bytes = bytes.len(), "Fetched source object");
        self.codec.decode(&bytes, key)
    }

    /// Encode an image and write it.
    pub fn store_image(
        &self,
        bucket: &str,
        key: &str,
        image: &Image,
        encoding: Encoding,
    ) -> PipelineResult<()> {
        let persist_error = |message: String| PipelineError::Persist {
            bucket: bucket.to_string(),
            key: key.to_string(),
            message,
        };

        let bytes = codec::encode(image.pixels(), encoding.format, encoding.quality)
            .map_err(|e| persist_error(e.to_string()))?;
        let size = bytes.len();
        self.store
            .put_object(bucket, key, bytes, encoding.format.content_type())
            .map_err(|e| persist_error(e.to_string()))?;

        tracing::debug!(bucket, key, bytes = size, format = %encoding.format, "Stored image");
        Ok(())
    }

    /// Time-limited retrieval reference using the configured expiry.
    pub fn get_retrieval_reference(&self, bucket: &str, key: &str) -> Result<String, StoreError> {
        self.store.retrieval_reference(bucket, key, self.url_expiry)
    }
}

/// Reject bucket names that could escape a store's namespace.
pub(crate) fn check_bucket(bucket: &str) -> Result<(), StoreError> {
    if bucket.is_empty()
        || bucket == "."
        || bucket == ".."
        || bucket.contains(['/', '\\'])
    {
        return Err(StoreError::InvalidKey(format!("bucket '{bucket}'")));
    }
    Ok(())
}

/// Keys are relative, `/`-separated paths without `.` or `..` segments.
pub(crate) fn check_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && !key.starts_with('/')
        && !key.contains('\\')
        && key
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..");
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(format!("key '{key}'")))
    }
}
