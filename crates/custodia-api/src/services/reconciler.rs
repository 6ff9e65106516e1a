//! Confirm reconciler: the second half of the upload handshake.
//!
//! A record becomes `confirmed` only after the object is verified to exist
//! in storage. The check-then-mark sequence is safe to repeat: confirming an
//! already-confirmed record is a no-op returning the record unchanged.

use std::sync::Arc;

use custodia_core::models::evidence::{EvidenceRecord, EvidenceStatus};
use custodia_core::repos::EvidenceLedger;
use custodia_core::AppError;
use custodia_storage::{retry_with_backoff, ObjectStorage, RetryPolicy};
use uuid::Uuid;

use crate::error::storage_to_app_error;

pub struct ConfirmReconciler {
    ledger: Arc<dyn EvidenceLedger>,
    storage: Arc<dyn ObjectStorage>,
    retry: RetryPolicy,
}

impl ConfirmReconciler {
    pub fn new(
        ledger: Arc<dyn EvidenceLedger>,
        storage: Arc<dyn ObjectStorage>,
        retry: RetryPolicy,
    ) -> Self {
        ConfirmReconciler {
            ledger,
            storage,
            retry,
        }
    }

    /// Confirm that the object behind a pending record has landed.
    ///
    /// `NotReady` means the object is not visible yet (eventual consistency
    /// or an upload still in flight): the record stays `pending` and the
    /// caller retries with backoff.
    #[tracing::instrument(skip(self), fields(file_id = %file_id, operation = "confirm_upload"))]
    pub async fn confirm(&self, file_id: Uuid) -> Result<EvidenceRecord, AppError> {
        let record = self
            .ledger
            .find_by_id(file_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Evidence not found: {}", file_id)))?;

        match record.status {
            EvidenceStatus::Confirmed => {
                tracing::debug!(key = %record.key, "Evidence already confirmed");
                return Ok(record);
            }
            EvidenceStatus::Orphaned => {
                return Err(AppError::Conflict(format!(
                    "Evidence {} was orphaned and cannot be confirmed",
                    file_id
                )));
            }
            EvidenceStatus::Pending => {}
        }

        let exists = retry_with_backoff(self.retry, || self.storage.exists(&record.key))
            .await
            .map_err(storage_to_app_error)?;

        if !exists {
            return Err(AppError::NotReady(format!(
                "Object for evidence {} is not visible in storage yet",
                file_id
            )));
        }

        let confirmed = self.ledger.mark_confirmed(file_id).await?;
        tracing::info!(
            key = %confirmed.key,
            report_id = %confirmed.report_id,
            "Evidence confirmed"
        );
        Ok(confirmed)
    }
}
