//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use custodia_core::repos::{DraftStore, EvidenceLedger, ExplorerIndex, ReportDirectory};
use custodia_core::Config;
use custodia_storage::{ObjectStorage, RetryPolicy};

/// Everything a handler or background service needs, injected as
/// `Arc<AppState>`. Repositories and storage sit behind trait objects so
/// tests can wire in the in-memory implementations.
pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn ObjectStorage>,
    pub ledger: Arc<dyn EvidenceLedger>,
    pub drafts: Arc<dyn DraftStore>,
    pub explorer: Arc<dyn ExplorerIndex>,
    pub reports: Arc<dyn ReportDirectory>,
}

impl AppState {
    pub fn new(
        config: Config,
        storage: Arc<dyn ObjectStorage>,
        ledger: Arc<dyn EvidenceLedger>,
        drafts: Arc<dyn DraftStore>,
        explorer: Arc<dyn ExplorerIndex>,
        reports: Arc<dyn ReportDirectory>,
    ) -> Self {
        AppState {
            config,
            storage,
            ledger,
            drafts,
            explorer,
            reports,
        }
    }

    /// Retry budget for upstream storage calls, from configuration.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.config.storage_retry_max_attempts,
            Duration::from_millis(self.config.storage_retry_base_delay_ms),
        )
    }
}
