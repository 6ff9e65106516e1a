//! In-memory storage backend.
//!
//! Backs the integration tests (simulated object landing between presign
//! and confirm) and doubles as a throwaway backend for tooling. Presigned
//! URLs are synthesized `memory://` URIs; they are not fetchable, but they
//! carry the key and expiry so tests can assert on credential scoping.

use crate::traits::{
    validate_key, ObjectStorage, StorageBackendKind, StorageError, StorageResult,
};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Default)]
pub struct MemoryStorage {
    bucket: String,
    objects: Arc<Mutex<HashMap<String, Bytes>>>,
}

impl MemoryStorage {
    pub fn new(bucket: impl Into<String>) -> Self {
        MemoryStorage {
            bucket: bucket.into(),
            objects: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of stored objects (test assertions).
    pub fn object_count(&self) -> usize {
        self.objects.lock().expect("memory storage poisoned").len()
    }

    fn signed_url(&self, verb: &str, key: &str, expires_in: Duration) -> String {
        format!(
            "memory://{}/{}?verb={}&expires={}",
            self.bucket,
            key,
            verb,
            expires_in.as_secs()
        )
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn presigned_put_url(
        &self,
        key: &str,
        _content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        validate_key(key)?;
        Ok(self.signed_url("put", key, expires_in))
    }

    async fn presigned_get_url(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        validate_key(key)?;
        if !self.objects.lock().expect("memory storage poisoned").contains_key(key) {
            return Err(StorageError::NotFound(key.to_string()));
        }
        Ok(self.signed_url("get", key, expires_in))
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        Ok(self
            .objects
            .lock()
            .expect("memory storage poisoned")
            .contains_key(key))
    }

    async fn content_length(&self, key: &str) -> StorageResult<u64> {
        validate_key(key)?;
        self.objects
            .lock()
            .expect("memory storage poisoned")
            .get(key)
            .map(|b| b.len() as u64)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn put(&self, key: &str, data: Bytes, _content_type: &str) -> StorageResult<()> {
        validate_key(key)?;
        self.objects
            .lock()
            .expect("memory storage poisoned")
            .insert(key.to_string(), data);
        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        validate_key(key)?;
        self.objects
            .lock()
            .expect("memory storage poisoned")
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        self.objects
            .lock()
            .expect("memory storage poisoned")
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    fn backend_kind(&self) -> StorageBackendKind {
        StorageBackendKind::Memory
    }
}
