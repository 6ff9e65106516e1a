use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::report::ReportType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DraftStatus {
    Active,
    Completed,
}

impl DraftStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftStatus::Active => "active",
            DraftStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<DraftStatus> {
        match s {
            "active" => Some(DraftStatus::Active),
            "completed" => Some(DraftStatus::Completed),
            _ => None,
        }
    }
}

/// An autosaved, not-yet-submitted report form.
///
/// At most one `active` draft exists per (user, report type); the storage
/// layer enforces this with a partial unique index. Evidence and signature
/// refs are opaque to the draft store - they may reference pending uploads
/// keyed to a temporary report id.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DraftRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub report_type: ReportType,
    pub form_data: serde_json::Value,
    pub evidence_refs: serde_json::Value,
    pub signature_refs: serde_json::Value,
    pub status: DraftStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Whole-document autosave payload. Upsert is last-writer-wins: no merging
/// or operational transforms.
#[derive(Debug, Clone)]
pub struct DraftPayload {
    pub form_data: serde_json::Value,
    pub evidence_refs: serde_json::Value,
    pub signature_refs: serde_json::Value,
    pub status: DraftStatus,
}
