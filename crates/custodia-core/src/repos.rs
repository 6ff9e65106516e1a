//! Repository trait seams.
//!
//! The API crate depends on these traits rather than on concrete sqlx
//! repositories, the same way storage backends sit behind the
//! `ObjectStorage` trait. Production wires in the Postgres implementations
//! from custodia-db; tests wire in the in-memory implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::keys::Namespace;
use crate::models::draft::{DraftPayload, DraftRecord};
use crate::models::evidence::{EvidenceRecord, NewEvidence};
use crate::models::explorer::{ExplorerNode, ExplorerScope};
use crate::models::report::{ReportContext, ReportType};

/// Metadata store of evidence records and their lifecycle state.
///
/// Every write is a single atomic operation keyed by the record id, so
/// interleaved requests never observe a half-written record.
#[async_trait]
pub trait EvidenceLedger: Send + Sync {
    /// Insert a new `pending` record. The key is unique; inserting a
    /// duplicate key is a conflict.
    async fn insert_pending(&self, evidence: NewEvidence) -> Result<EvidenceRecord, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<EvidenceRecord>, AppError>;

    async fn find_by_key(&self, key: &str) -> Result<Option<EvidenceRecord>, AppError>;

    /// Find a still-credentialed `pending` record for the same logical file,
    /// so a presign retry re-issues credentials instead of minting a second
    /// storage path. Namespace and report type are part of the identity: a
    /// signature and an evidence upload of the same filename are distinct
    /// files with distinct keys.
    async fn find_reusable_pending(
        &self,
        report_id: Uuid,
        namespace: Namespace,
        report_type: ReportType,
        original_name: &str,
        size_bytes: i64,
        issued_after: DateTime<Utc>,
    ) -> Result<Option<EvidenceRecord>, AppError>;

    /// Transition `pending -> confirmed`. Idempotent: confirming an
    /// already-confirmed record returns it unchanged. Confirming an
    /// `orphaned` record is a conflict; a missing id is not found.
    async fn mark_confirmed(&self, id: Uuid) -> Result<EvidenceRecord, AppError>;

    /// Transition `pending -> orphaned`. Never touches a confirmed record.
    async fn mark_orphaned(&self, id: Uuid) -> Result<EvidenceRecord, AppError>;

    async fn list_by_report(
        &self,
        report_id: Uuid,
        include_pending: bool,
    ) -> Result<Vec<EvidenceRecord>, AppError>;

    /// Pending records created before the cutoff: orphan-sweep candidates.
    async fn list_stale_pending(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<EvidenceRecord>, AppError>;

    /// Soft cascade when a report is voided: mark its non-orphaned records
    /// orphaned so the explorer stops surfacing them. Objects are never
    /// deleted here; physical cleanup is a separate operational concern.
    async fn orphan_by_report(&self, report_id: Uuid) -> Result<u64, AppError>;
}

/// Staging area for in-progress report forms and their evidence references.
#[async_trait]
pub trait DraftStore: Send + Sync {
    async fn get_active(
        &self,
        user_id: Uuid,
        report_type: ReportType,
    ) -> Result<Option<DraftRecord>, AppError>;

    /// Last-writer-wins whole-document upsert into the single active slot
    /// for (user, report type). Never creates a second active draft.
    async fn upsert(
        &self,
        user_id: Uuid,
        report_type: ReportType,
        payload: DraftPayload,
    ) -> Result<DraftRecord, AppError>;

    /// Insert a new draft, failing with `Conflict` when the active slot for
    /// (user, report type) is already taken. The slot check and the insert
    /// are one atomic operation, so concurrent saves under the `reject`
    /// policy cannot both win.
    async fn insert(
        &self,
        user_id: Uuid,
        report_type: ReportType,
        payload: DraftPayload,
    ) -> Result<DraftRecord, AppError>;

    /// Replace an existing draft by id (ownership-checked).
    async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        payload: DraftPayload,
    ) -> Result<DraftRecord, AppError>;

    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool, AppError>;
}

/// Read path over the ledger: one aggregation per hierarchy level, plus
/// scoped substring search.
#[async_trait]
pub trait ExplorerIndex: Send + Sync {
    /// Materialize one level deeper than the most specific scope coordinate.
    /// Folder counts include only confirmed evidence.
    async fn list(&self, scope: &ExplorerScope) -> Result<Vec<ExplorerNode>, AppError>;

    /// Case-insensitive substring match on original filename or report
    /// folio, constrained to the scope. Returns leaf nodes only.
    async fn search(&self, q: &str, scope: &ExplorerScope)
        -> Result<Vec<ExplorerNode>, AppError>;
}

/// Interface onto the external report stores: resolves the hierarchy
/// coordinates of an owning report. Report CRUD itself is out of scope.
#[async_trait]
pub trait ReportDirectory: Send + Sync {
    async fn lookup(
        &self,
        report_type: ReportType,
        report_id: Uuid,
    ) -> Result<Option<ReportContext>, AppError>;
}
