//! Filesystem object store.
//!
//! Each bucket is a directory under the store root and each key a relative
//! path inside it. Retrieval references are `file://` URLs with an expiry
//! timestamp and a keyed BLAKE3 signature:
//!
//! ```text
//! file:///srv/prism/photos/batch_cat.png?expires=1718000000&signature=9f2c…
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::{check_bucket, check_key, ObjectStore};
use crate::error::StoreError;

const SIGNING_CONTEXT: &str = "prism 2024 retrieval reference signing";

/// Object store backed by a directory tree.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
    signing_key: [u8; 32],
}

impl LocalObjectStore {
    /// Create a store rooted at `root`, signing references with a key derived
    /// from `secret`.
    pub fn new(root: impl Into<PathBuf>, secret: &str) -> Self {
        Self {
            root: root.into(),
            signing_key: blake3::derive_key(SIGNING_CONTEXT, secret.as_bytes()),
        }
    }

    /// Filesystem path of an object, after validating bucket and key.
    pub fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StoreError> {
        check_bucket(bucket)?;
        check_key(key)?;
        let mut path = self.root.join(bucket);
        for segment in key.split('/') {
            path.push(segment);
        }
        Ok(path)
    }

    /// Check a reference produced by this store and return the object path.
    ///
    /// Fails if the reference is malformed, the signature does not match, or
    /// it has expired at `now`.
    pub fn verify_reference(&self, reference: &str, now: SystemTime) -> Result<PathBuf, StoreError> {
        let invalid = || StoreError::InvalidKey(format!("reference '{reference}'"));

        let rest = reference.strip_prefix("file://").ok_or_else(invalid)?;
        let (path, query) = rest.split_once('?').ok_or_else(invalid)?;

        let mut expires = None;
        let mut signature = None;
        for pair in query.split('&') {
            match pair.split_once('=') {
                Some(("expires", value)) => expires = value.parse::<u64>().ok(),
                Some(("signature", value)) => signature = blake3::Hash::from_hex(value).ok(),
                _ => {}
            }
        }
        let (expires, signature) = expires.zip(signature).ok_or_else(invalid)?;

        // blake3::Hash equality is constant-time
        if self.sign(path, expires) != signature {
            return Err(StoreError::InvalidKey("reference signature mismatch".into()));
        }
        if unix_seconds(now) > expires {
            return Err(StoreError::InvalidKey("reference has expired".into()));
        }
        Ok(PathBuf::from(path))
    }

    fn sign(&self, path: &str, expires: u64) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new_keyed(&self.signing_key);
        hasher.update(path.as_bytes());
        hasher.update(b"\n");
        hasher.update(expires.to_string().as_bytes());
        hasher.finalize()
    }

    fn reference_at(&self, path: &Path, expires: u64) -> String {
        let path = path.to_string_lossy();
        let signature = self.sign(&path, expires);
        format!("file://{path}?expires={expires}&signature={}", signature.to_hex())
    }
}

impl ObjectStore for LocalObjectStore {
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.object_path(bucket, key)?;
        fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            _ => StoreError::Io(e),
        })
    }

    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), StoreError> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        Ok(())
    }

    fn retrieval_reference(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, StoreError> {
        let path = self.object_path(bucket, key)?;
        if !path.is_file() {
            return Err(StoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }
        let path = fs::canonicalize(&path)?;
        let expires = unix_seconds(SystemTime::now()) + expires_in.as_secs();
        Ok(self.reference_at(&path, expires))
    }
}

fn unix_seconds(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
