//! Storage abstraction trait
//!
//! This module defines the ObjectStorage trait that all storage backends
//! must implement. The broker and reconciler work against this trait and
//! never against a concrete backend.

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Presign failed: {0}")]
    PresignFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StorageError {
    /// Whether a retry against the backend could plausibly succeed.
    /// NotFound, invalid keys, and configuration problems are terminal.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StorageError::PresignFailed(_)
                | StorageError::DeleteFailed(_)
                | StorageError::BackendError(_)
                | StorageError::IoError(_)
        )
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Which backend a storage instance talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackendKind {
    S3,
    Local,
    Memory,
}

/// Object-store abstraction for the evidence pipeline.
///
/// Upload bytes never transit the application server, so there is no
/// streaming upload here: clients write directly against presigned PUT
/// credentials scoped to a single key.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Generate a presigned PUT URL scoped to exactly one key.
    ///
    /// Expiry must be short (minutes); it bounds the ledger's
    /// pending-record window. Backends without presign support return a
    /// `ConfigError`.
    async fn presigned_put_url(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Generate a presigned GET URL for direct download access.
    async fn presigned_get_url(&self, key: &str, expires_in: Duration) -> StorageResult<String>;

    /// HEAD-equivalent existence check, used by confirm and the orphan sweep.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Size in bytes of an object, if it exists.
    async fn content_length(&self, key: &str) -> StorageResult<u64>;

    /// Write an object directly. Operational tooling and tests only; the
    /// production upload path is the presigned PUT.
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<()>;

    /// Read an object directly. Operational tooling and tests only.
    async fn get(&self, key: &str) -> StorageResult<Bytes>;

    /// Delete an object.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// The backend type behind this instance.
    fn backend_kind(&self) -> StorageBackendKind;
}

/// Reject keys that could escape the bucket namespace. All backends call
/// this before touching the backing store.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() || key.starts_with('/') || key.contains("..") {
        return Err(StorageError::InvalidKey(format!(
            "Storage key '{}' contains invalid path components",
            key
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key_rejects_traversal() {
        assert!(validate_key("evidences/../secrets").is_err());
        assert!(validate_key("/evidences/a.jpg").is_err());
        assert!(validate_key("").is_err());
        assert!(validate_key("evidences/work/bombas/2024/03/07/r/f_a.jpg").is_ok());
    }

    #[test]
    fn test_not_found_is_terminal() {
        assert!(!StorageError::NotFound("k".into()).is_retryable());
        assert!(StorageError::BackendError("503".into()).is_retryable());
    }
}
