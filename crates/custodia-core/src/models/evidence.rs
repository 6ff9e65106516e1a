use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::keys::Namespace;
use crate::models::report::ReportType;

/// Lifecycle state of an evidence record.
///
/// Transitions are one-directional: `pending -> confirmed` or
/// `pending -> orphaned`. A confirmed record is never reverted to pending;
/// the only path that orphans one is the cascade that retires every record
/// of a voided report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceStatus {
    Pending,
    Confirmed,
    Orphaned,
}

impl EvidenceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceStatus::Pending => "pending",
            EvidenceStatus::Confirmed => "confirmed",
            EvidenceStatus::Orphaned => "orphaned",
        }
    }

    pub fn parse(s: &str) -> Option<EvidenceStatus> {
        match s {
            "pending" => Some(EvidenceStatus::Pending),
            "confirmed" => Some(EvidenceStatus::Confirmed),
            "orphaned" => Some(EvidenceStatus::Orphaned),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, EvidenceStatus::Pending)
    }
}

impl std::fmt::Display for EvidenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One evidence file tracked by the ledger.
///
/// The `key` is the full hierarchical object-store path, immutable once set
/// and unique across all records. The subsystem slug, date, and folio are
/// denormalized at presign time so explorer aggregation and search never
/// join against the external report stores.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceRecord {
    pub id: Uuid,
    pub key: String,
    pub report_id: Uuid,
    pub report_type: ReportType,
    pub report_folio: String,
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub subsystem: String,
    pub subsystem_slug: String,
    pub evidence_date: NaiveDate,
    pub namespace: Namespace,
    pub status: EvidenceStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<DateTime<Utc>>,
}

/// Insert payload for a new pending evidence record. The id doubles as the
/// client-facing file id embedded in the object key.
#[derive(Debug, Clone)]
pub struct NewEvidence {
    pub id: Uuid,
    pub key: String,
    pub report_id: Uuid,
    pub report_type: ReportType,
    pub report_folio: String,
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub subsystem: String,
    pub subsystem_slug: String,
    pub evidence_date: NaiveDate,
    pub namespace: Namespace,
}
