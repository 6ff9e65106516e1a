//! Storage backend setup

use std::sync::Arc;

use anyhow::{Context, Result};
use custodia_core::Config;
use custodia_storage::{create_storage, ObjectStorage};

/// Create the configured object-storage backend.
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn ObjectStorage>> {
    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage backend")?;

    tracing::info!(
        backend = ?storage.backend_kind(),
        bucket = %config.bucket_name(),
        "Storage backend initialized"
    );

    Ok(storage)
}
