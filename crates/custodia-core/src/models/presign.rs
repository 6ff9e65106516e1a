use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::keys::Namespace;
use crate::models::evidence::EvidenceRecord;
use crate::models::report::ReportType;

fn default_namespace() -> Namespace {
    Namespace::Evidences
}

/// Request to issue time-boxed upload credentials for one evidence file.
///
/// For evidence attached to a saved report, only `report_id`/`report_type`
/// are needed; the hierarchy coordinates come from the report stores. For
/// pre-report staging (e.g. warehouse items photographed before the report
/// is saved), the caller supplies `subsystem` and `date` explicitly together
/// with its temporary report id.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PresignUploadRequest {
    pub report_id: Uuid,
    pub report_type: ReportType,
    #[validate(length(
        min = 1,
        max = 255,
        message = "Filename must be between 1 and 255 characters"
    ))]
    pub original_name: String,
    #[validate(length(
        min = 1,
        max = 255,
        message = "Content type must be between 1 and 255 characters"
    ))]
    pub mime_type: String,
    #[validate(range(min = 1, message = "File size must be at least 1 byte"))]
    pub size_bytes: u64,
    #[serde(default)]
    pub subsystem: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default = "default_namespace")]
    pub namespace: Namespace,
}

/// Scoped, single-key upload credentials.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadCredentials {
    /// Presigned PUT URL scoped to exactly one key.
    pub url: String,
    /// Extra form fields for POST-style uploads; None for plain PUT.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PresignUploadResponse {
    pub file_id: Uuid,
    pub key: String,
    pub bucket: String,
    pub upload: UploadCredentials,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmUploadRequest {
    pub file_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmUploadResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<EvidenceRecord>,
}

/// Download presign request: a ledger file id or a raw key under a known
/// namespace. Exactly one must be given.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PresignDownloadRequest {
    #[serde(default)]
    pub file_id: Option<Uuid>,
    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PresignDownloadResponse {
    pub url: String,
    pub expires_in_seconds: u64,
}
