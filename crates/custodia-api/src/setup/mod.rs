//! Application setup and initialization
//!
//! All startup logic lives here rather than in main.rs: telemetry, database
//! pool and migrations, storage backend, repositories, the orphan sweep, and
//! route construction.

pub mod database;
pub mod routes;
pub mod server;
pub mod storage;

use std::sync::Arc;

use anyhow::Result;
use custodia_core::Config;
use custodia_db::{PgDraftStore, PgEvidenceLedger, PgExplorerIndex, PgReportDirectory};

use crate::services::sweep::OrphanSweep;
use crate::state::AppState;

/// Initialize the entire application.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry();
    config.validate()?;
    tracing::info!("Configuration loaded and validated");

    let pool = database::setup_database(&config).await?;
    let object_storage = storage::setup_storage(&config).await?;

    let state = Arc::new(AppState::new(
        config.clone(),
        object_storage.clone(),
        Arc::new(PgEvidenceLedger::new(pool.clone())),
        Arc::new(PgDraftStore::new(pool.clone())),
        Arc::new(PgExplorerIndex::new(pool.clone())),
        Arc::new(PgReportDirectory::new(pool)),
    ));

    // Background retirement of abandoned pending records.
    let sweep = Arc::new(OrphanSweep::new(
        state.ledger.clone(),
        state.storage.clone(),
        config.orphan_grace_minutes,
        std::time::Duration::from_secs(config.sweep_interval_secs),
    ));
    sweep.start();
    tracing::info!(
        grace_minutes = config.orphan_grace_minutes,
        interval_secs = config.sweep_interval_secs,
        "Orphan sweep started"
    );

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
