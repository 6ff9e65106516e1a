//! Custodia Storage Library
//!
//! Object-store abstraction and backends for the evidence pipeline. The
//! server never proxies upload bytes; backends exist to issue scoped
//! presigned credentials, answer existence/metadata checks during confirm,
//! and delete objects during operational cleanup.
//!
//! # Key format
//!
//! All backends receive pre-built hierarchical keys from custodia-core's
//! key builder (`evidences/...` or `signatures/...`). Keys must not contain
//! `..` or a leading `/`.

pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod memory;
pub mod retry;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use memory::MemoryStorage;
pub use retry::{retry_with_backoff, RetryPolicy};
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{ObjectStorage, StorageBackendKind, StorageError, StorageResult};
