//! Storage backend factory.

use std::sync::Arc;

use custodia_core::{Config, StorageBackend};

use crate::traits::{ObjectStorage, StorageError, StorageResult};

/// Create the configured storage backend.
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn ObjectStorage>> {
    match config.storage_backend {
        StorageBackend::S3 => {
            #[cfg(feature = "storage-s3")]
            {
                let bucket = config.s3_bucket.clone().ok_or_else(|| {
                    StorageError::ConfigError("S3_BUCKET must be set for S3 storage".to_string())
                })?;
                let region = config.s3_region.clone().ok_or_else(|| {
                    StorageError::ConfigError("S3_REGION must be set for S3 storage".to_string())
                })?;
                let storage =
                    crate::s3::S3Storage::new(bucket, region, config.s3_endpoint.clone())?;
                Ok(Arc::new(storage))
            }
            #[cfg(not(feature = "storage-s3"))]
            {
                Err(StorageError::ConfigError(
                    "S3 backend requested but the storage-s3 feature is disabled".to_string(),
                ))
            }
        }
        StorageBackend::Local => {
            #[cfg(feature = "storage-local")]
            {
                let base_path = config.local_storage_path.clone().ok_or_else(|| {
                    StorageError::ConfigError(
                        "LOCAL_STORAGE_PATH must be set for local storage".to_string(),
                    )
                })?;
                let base_url = format!("http://localhost:{}/files", config.server_port);
                let storage = crate::local::LocalStorage::new(base_path, base_url).await?;
                Ok(Arc::new(storage))
            }
            #[cfg(not(feature = "storage-local"))]
            {
                Err(StorageError::ConfigError(
                    "Local backend requested but the storage-local feature is disabled"
                        .to_string(),
                ))
            }
        }
    }
}
