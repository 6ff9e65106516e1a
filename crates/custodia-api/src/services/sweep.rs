//! Orphan sweep: background retirement of abandoned pending records.
//!
//! A pending record older than the grace window whose object never landed
//! is marked `orphaned` so the explorer and report listings stop waiting
//! for it. Records whose object exists are left `pending` - the confirm
//! endpoint remains the only path to `confirmed`. Confirmed records are
//! never touched.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use custodia_core::repos::EvidenceLedger;
use custodia_storage::ObjectStorage;
use tokio::time::interval;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    pub scanned: usize,
    pub orphaned: usize,
    pub kept_pending: usize,
    pub errors: usize,
}

pub struct OrphanSweep {
    ledger: Arc<dyn EvidenceLedger>,
    storage: Arc<dyn ObjectStorage>,
    grace: chrono::Duration,
    sweep_interval: Duration,
}

impl OrphanSweep {
    pub fn new(
        ledger: Arc<dyn EvidenceLedger>,
        storage: Arc<dyn ObjectStorage>,
        grace_minutes: i64,
        sweep_interval: Duration,
    ) -> Self {
        OrphanSweep {
            ledger,
            storage,
            grace: chrono::Duration::minutes(grace_minutes),
            sweep_interval,
        }
    }

    /// Start the background sweep loop. Returns a JoinHandle for shutdown.
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut sweep_interval = interval(self.sweep_interval);

            loop {
                sweep_interval.tick().await;

                match self.run_once().await {
                    Ok(stats) => {
                        tracing::info!(
                            scanned = stats.scanned,
                            orphaned = stats.orphaned,
                            kept_pending = stats.kept_pending,
                            errors = stats.errors,
                            "Orphan sweep cycle completed"
                        );
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Orphan sweep cycle failed");
                    }
                }
            }
        })
    }

    /// One sweep cycle. Per-record failures are logged and skipped; the
    /// record stays pending and is retried next cycle.
    #[tracing::instrument(skip(self), fields(operation = "orphan_sweep"))]
    pub async fn run_once(&self) -> Result<SweepStats, anyhow::Error> {
        let cutoff = Utc::now() - self.grace;
        let stale = self.ledger.list_stale_pending(cutoff).await?;

        let mut stats = SweepStats {
            scanned: stale.len(),
            ..SweepStats::default()
        };

        for record in stale {
            match self.storage.exists(&record.key).await {
                Ok(true) => {
                    // Uploaded but never confirmed. Left pending so a late
                    // confirm call can still land.
                    stats.kept_pending += 1;
                }
                Ok(false) => match self.ledger.mark_orphaned(record.id).await {
                    Ok(_) => {
                        tracing::info!(
                            file_id = %record.id,
                            key = %record.key,
                            created_at = %record.created_at,
                            "Marked abandoned pending evidence as orphaned"
                        );
                        stats.orphaned += 1;
                    }
                    Err(e) => {
                        tracing::warn!(
                            file_id = %record.id,
                            error = %e,
                            "Failed to orphan stale pending evidence"
                        );
                        stats.errors += 1;
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        file_id = %record.id,
                        key = %record.key,
                        error = %e,
                        "Existence check failed during sweep, will retry next cycle"
                    );
                    stats.errors += 1;
                }
            }
        }

        Ok(stats)
    }
}
