//! In-memory object store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use super::{check_bucket, check_key, ObjectStore};
use crate::error::StoreError;

/// Thread-safe store keeping objects in a map.
///
/// Counts successful writes and can be told to fail them, which makes it the
/// store of choice for tests and for embedders that handle bytes themselves.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
    puts: AtomicUsize,
    fail_puts: AtomicBool,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object without counting it as a put.
    pub fn insert(&self, bucket: &str, key: &str, bytes: Vec<u8>) {
        self.objects()
            .insert((bucket.to_string(), key.to_string()), bytes);
    }

    pub fn get(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.objects()
            .contains_key(&(bucket.to_string(), key.to_string()))
    }

    /// Keys in `bucket`, sorted.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects()
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Number of successful `put_object` calls so far.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Make subsequent `put_object` calls fail.
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    fn objects(&self) -> MutexGuard<'_, HashMap<(String, String), Vec<u8>>> {
        self.objects.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ObjectStore for MemoryObjectStore {
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        check_bucket(bucket)?;
        check_key(key)?;
        self.get(bucket, key).ok_or_else(|| StoreError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }

    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), StoreError> {
        check_bucket(bucket)?;
        check_key(key)?;
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("writes are disabled".into()));
        }
        self.insert(bucket, key, bytes);
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn retrieval_reference(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, StoreError> {
        if !self.contains(bucket, key) {
            return Err(StoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }
        Ok(format!(
            "memory://{bucket}/{key}?expires_in={}",
            expires_in.as_secs()
        ))
    }
}
