//! Presign broker: issues time-boxed, single-key storage credentials.
//!
//! Upload bytes never transit this service. The broker validates declared
//! metadata, resolves the hierarchy coordinates of the owning report, writes
//! a `pending` ledger record, and hands the client a presigned PUT URL
//! scoped to exactly one key.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use custodia_core::models::presign::{
    PresignDownloadRequest, PresignDownloadResponse, PresignUploadRequest, PresignUploadResponse,
    UploadCredentials,
};
use custodia_core::models::evidence::NewEvidence;
use custodia_core::models::report::ReportContext;
use custodia_core::repos::{EvidenceLedger, ReportDirectory};
use custodia_core::{build_key, slugify, validate_upload, AppError, Config, Namespace};
use custodia_storage::{retry_with_backoff, ObjectStorage, RetryPolicy};
use uuid::Uuid;
use validator::Validate;

use crate::error::storage_to_app_error;

pub struct PresignBroker {
    ledger: Arc<dyn EvidenceLedger>,
    reports: Arc<dyn ReportDirectory>,
    storage: Arc<dyn ObjectStorage>,
    config: Config,
    retry: RetryPolicy,
}

impl PresignBroker {
    pub fn new(
        ledger: Arc<dyn EvidenceLedger>,
        reports: Arc<dyn ReportDirectory>,
        storage: Arc<dyn ObjectStorage>,
        config: Config,
        retry: RetryPolicy,
    ) -> Self {
        PresignBroker {
            ledger,
            reports,
            storage,
            config,
            retry,
        }
    }

    /// Issue upload credentials for one evidence file.
    #[tracing::instrument(
        skip(self, request),
        fields(
            report_id = %request.report_id,
            report_type = %request.report_type,
            namespace = %request.namespace,
            operation = "presign_upload"
        )
    )]
    pub async fn presign_upload(
        &self,
        request: PresignUploadRequest,
    ) -> Result<PresignUploadResponse, AppError> {
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        validate_upload(
            &request.original_name,
            &request.mime_type,
            request.size_bytes,
            &self.config.upload_limits(),
        )?;

        let context = self.resolve_context(&request).await?;
        let expiry = Duration::from_secs(self.config.upload_url_expiry_secs);
        let expires_at = Utc::now() + chrono::Duration::seconds(expiry.as_secs() as i64);

        // A presign retry for the same logical file re-issues credentials
        // for the existing key instead of minting a second storage path.
        let issued_after = Utc::now() - chrono::Duration::seconds(expiry.as_secs() as i64);
        let record = match self
            .ledger
            .find_reusable_pending(
                request.report_id,
                request.namespace,
                request.report_type,
                &request.original_name,
                request.size_bytes as i64,
                issued_after,
            )
            .await?
        {
            Some(existing) => {
                tracing::info!(
                    file_id = %existing.id,
                    key = %existing.key,
                    "Reusing pending evidence record for presign retry"
                );
                existing
            }
            None => {
                let file_id = Uuid::new_v4();
                let key = build_key(
                    request.namespace,
                    request.report_type,
                    &context.subsystem,
                    context.date,
                    request.report_id,
                    file_id,
                    &request.original_name,
                )?;

                self.ledger
                    .insert_pending(NewEvidence {
                        id: file_id,
                        key,
                        report_id: request.report_id,
                        report_type: request.report_type,
                        report_folio: context.folio.clone(),
                        original_name: request.original_name.clone(),
                        mime_type: request.mime_type.clone(),
                        size_bytes: request.size_bytes as i64,
                        subsystem: context.subsystem.clone(),
                        subsystem_slug: slugify(&context.subsystem),
                        evidence_date: context.date,
                        namespace: request.namespace,
                    })
                    .await?
            }
        };

        let url = retry_with_backoff(self.retry, || {
            self.storage
                .presigned_put_url(&record.key, &request.mime_type, expiry)
        })
        .await
        .map_err(storage_to_app_error)?;

        tracing::info!(
            file_id = %record.id,
            key = %record.key,
            expires_at = %expires_at,
            "Issued presigned upload credentials"
        );

        Ok(PresignUploadResponse {
            file_id: record.id,
            key: record.key,
            bucket: self.config.bucket_name(),
            upload: UploadCredentials { url, fields: None },
            expires_at,
        })
    }

    /// Issue a short-lived download URL for a ledger id or raw key.
    #[tracing::instrument(skip(self, request), fields(operation = "presign_download"))]
    pub async fn presign_download(
        &self,
        request: PresignDownloadRequest,
    ) -> Result<PresignDownloadResponse, AppError> {
        let key = match (request.file_id, request.key) {
            (Some(file_id), None) => {
                let record = self.ledger.find_by_id(file_id).await?.ok_or_else(|| {
                    AppError::NotFound(format!("Evidence not found: {}", file_id))
                })?;
                record.key
            }
            (None, Some(key)) => {
                Namespace::from_key(&key).ok_or_else(|| {
                    AppError::Validation(format!(
                        "Key '{}' is not under a known namespace",
                        key
                    ))
                })?;
                key
            }
            _ => {
                return Err(AppError::Validation(
                    "Exactly one of fileId or key must be provided".to_string(),
                ))
            }
        };

        let expiry = Duration::from_secs(self.config.download_url_expiry_secs);
        let url = retry_with_backoff(self.retry, || {
            self.storage.presigned_get_url(&key, expiry)
        })
        .await
        .map_err(storage_to_app_error)?;

        Ok(PresignDownloadResponse {
            url,
            expires_in_seconds: self.config.download_url_expiry_secs,
        })
    }

    /// Hierarchy coordinates: explicit subsystem+date for pre-report staging,
    /// otherwise resolved through the report directory.
    async fn resolve_context(
        &self,
        request: &PresignUploadRequest,
    ) -> Result<ReportContext, AppError> {
        if let (Some(subsystem), Some(date)) = (&request.subsystem, request.date) {
            if subsystem.trim().is_empty() {
                return Err(AppError::Validation(
                    "Subsystem must not be blank".to_string(),
                ));
            }
            return Ok(ReportContext {
                subsystem: subsystem.clone(),
                date,
                folio: String::new(),
            });
        }

        self.reports
            .lookup(request.report_type, request.report_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "{} report not found: {}",
                    request.report_type, request.report_id
                ))
            })
    }
}
