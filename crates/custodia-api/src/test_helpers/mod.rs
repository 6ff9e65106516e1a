//! In-memory repository implementations.
//!
//! These mirror the Postgres repositories' semantics closely enough for the
//! integration tests to exercise the full pipeline without a live database:
//! the ledger enforces the one-directional lifecycle, the explorer computes
//! the same level aggregations, and the draft store keeps the single active
//! slot per (user, report type).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use custodia_core::models::draft::{DraftPayload, DraftRecord, DraftStatus};
use custodia_core::models::evidence::{EvidenceRecord, EvidenceStatus, NewEvidence};
use custodia_core::models::explorer::{ExplorerDepth, ExplorerNode, ExplorerScope};
use custodia_core::models::report::ReportContext;
use custodia_core::repos::{DraftStore, EvidenceLedger, ExplorerIndex, ReportDirectory};
use custodia_core::{AppError, Config, DraftConflictPolicy, Namespace, ReportType, StorageBackend};
use uuid::Uuid;

/// Configuration with test-friendly defaults (no env access).
pub fn test_config() -> Config {
    Config {
        server_port: 0,
        environment: "test".to_string(),
        cors_origins: vec!["*".to_string()],
        database_url: String::new(),
        db_max_connections: 1,
        db_timeout_seconds: 5,
        storage_backend: StorageBackend::S3,
        s3_bucket: Some("custodia-test".to_string()),
        s3_region: Some("us-east-1".to_string()),
        s3_endpoint: None,
        local_storage_path: None,
        upload_url_expiry_secs: 900,
        download_url_expiry_secs: 300,
        orphan_grace_minutes: 60,
        sweep_interval_secs: 900,
        storage_retry_max_attempts: 2,
        storage_retry_base_delay_ms: 1,
        draft_conflict_policy: DraftConflictPolicy::Replace,
        max_evidence_size_bytes: 25 * 1024 * 1024,
        allowed_content_types: vec![
            "image/jpeg".to_string(),
            "image/png".to_string(),
            "application/pdf".to_string(),
        ],
    }
}

/// In-memory evidence ledger.
#[derive(Default)]
pub struct MemoryLedger {
    records: Mutex<HashMap<Uuid, EvidenceRecord>>,
}

impl MemoryLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(MemoryLedger::default())
    }

    /// Snapshot of all records, for assertions.
    pub fn all(&self) -> Vec<EvidenceRecord> {
        self.records.lock().unwrap().values().cloned().collect()
    }

    /// Backdate a record's creation time, for sweep tests.
    pub fn backdate(&self, id: Uuid, created_at: DateTime<Utc>) {
        if let Some(record) = self.records.lock().unwrap().get_mut(&id) {
            record.created_at = created_at;
        }
    }
}

#[async_trait]
impl EvidenceLedger for MemoryLedger {
    async fn insert_pending(&self, evidence: NewEvidence) -> Result<EvidenceRecord, AppError> {
        let mut records = self.records.lock().unwrap();
        if records.values().any(|r| r.key == evidence.key) {
            return Err(AppError::Conflict(format!(
                "Evidence key already exists: {}",
                evidence.key
            )));
        }

        let record = EvidenceRecord {
            id: evidence.id,
            key: evidence.key,
            report_id: evidence.report_id,
            report_type: evidence.report_type,
            report_folio: evidence.report_folio,
            original_name: evidence.original_name,
            mime_type: evidence.mime_type,
            size_bytes: evidence.size_bytes,
            subsystem: evidence.subsystem,
            subsystem_slug: evidence.subsystem_slug,
            evidence_date: evidence.evidence_date,
            namespace: evidence.namespace,
            status: EvidenceStatus::Pending,
            created_at: Utc::now(),
            confirmed_at: None,
        };
        records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<EvidenceRecord>, AppError> {
        Ok(self.records.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<EvidenceRecord>, AppError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .find(|r| r.key == key)
            .cloned())
    }

    async fn find_reusable_pending(
        &self,
        report_id: Uuid,
        namespace: Namespace,
        report_type: ReportType,
        original_name: &str,
        size_bytes: i64,
        issued_after: DateTime<Utc>,
    ) -> Result<Option<EvidenceRecord>, AppError> {
        let records = self.records.lock().unwrap();
        let mut candidates: Vec<&EvidenceRecord> = records
            .values()
            .filter(|r| {
                r.report_id == report_id
                    && r.namespace == namespace
                    && r.report_type == report_type
                    && r.original_name == original_name
                    && r.size_bytes == size_bytes
                    && r.status == EvidenceStatus::Pending
                    && r.created_at >= issued_after
            })
            .collect();
        candidates.sort_by_key(|r| r.created_at);
        Ok(candidates.last().map(|r| (*r).clone()))
    }

    async fn mark_confirmed(&self, id: Uuid) -> Result<EvidenceRecord, AppError> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Evidence not found: {}", id)))?;

        match record.status {
            EvidenceStatus::Pending => {
                record.status = EvidenceStatus::Confirmed;
                record.confirmed_at = Some(Utc::now());
                Ok(record.clone())
            }
            EvidenceStatus::Confirmed => Ok(record.clone()),
            EvidenceStatus::Orphaned => Err(AppError::Conflict(format!(
                "Evidence {} was orphaned and cannot be confirmed",
                id
            ))),
        }
    }

    async fn mark_orphaned(&self, id: Uuid) -> Result<EvidenceRecord, AppError> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Evidence not found: {}", id)))?;

        match record.status {
            EvidenceStatus::Pending => {
                record.status = EvidenceStatus::Orphaned;
                Ok(record.clone())
            }
            status => Err(AppError::Conflict(format!(
                "Evidence {} is {} and cannot be orphaned",
                id, status
            ))),
        }
    }

    async fn list_by_report(
        &self,
        report_id: Uuid,
        include_pending: bool,
    ) -> Result<Vec<EvidenceRecord>, AppError> {
        let records = self.records.lock().unwrap();
        let mut matching: Vec<EvidenceRecord> = records
            .values()
            .filter(|r| {
                r.report_id == report_id
                    && (r.status == EvidenceStatus::Confirmed
                        || (include_pending && r.status == EvidenceStatus::Pending))
            })
            .cloned()
            .collect();
        matching.sort_by_key(|r| r.created_at);
        Ok(matching)
    }

    async fn list_stale_pending(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<EvidenceRecord>, AppError> {
        let records = self.records.lock().unwrap();
        let mut stale: Vec<EvidenceRecord> = records
            .values()
            .filter(|r| r.status == EvidenceStatus::Pending && r.created_at < cutoff)
            .cloned()
            .collect();
        stale.sort_by_key(|r| r.created_at);
        Ok(stale)
    }

    async fn orphan_by_report(&self, report_id: Uuid) -> Result<u64, AppError> {
        let mut records = self.records.lock().unwrap();
        let mut count = 0u64;
        for record in records.values_mut() {
            if record.report_id == report_id && record.status != EvidenceStatus::Orphaned {
                record.status = EvidenceStatus::Orphaned;
                count += 1;
            }
        }
        Ok(count)
    }
}

/// In-memory draft store with the single-active-slot semantics.
#[derive(Default)]
pub struct MemoryDraftStore {
    drafts: Mutex<HashMap<Uuid, DraftRecord>>,
}

impl MemoryDraftStore {
    pub fn new() -> Arc<Self> {
        Arc::new(MemoryDraftStore::default())
    }

    pub fn count(&self) -> usize {
        self.drafts.lock().unwrap().len()
    }
}

#[async_trait]
impl DraftStore for MemoryDraftStore {
    async fn get_active(
        &self,
        user_id: Uuid,
        report_type: ReportType,
    ) -> Result<Option<DraftRecord>, AppError> {
        Ok(self
            .drafts
            .lock()
            .unwrap()
            .values()
            .find(|d| {
                d.user_id == user_id
                    && d.report_type == report_type
                    && d.status == DraftStatus::Active
            })
            .cloned())
    }

    async fn upsert(
        &self,
        user_id: Uuid,
        report_type: ReportType,
        payload: DraftPayload,
    ) -> Result<DraftRecord, AppError> {
        let mut drafts = self.drafts.lock().unwrap();
        let existing_id = drafts
            .values()
            .find(|d| {
                d.user_id == user_id
                    && d.report_type == report_type
                    && d.status == DraftStatus::Active
            })
            .map(|d| d.id);

        let record = match existing_id {
            Some(id) => {
                let draft = drafts.get_mut(&id).unwrap();
                draft.form_data = payload.form_data;
                draft.evidence_refs = payload.evidence_refs;
                draft.signature_refs = payload.signature_refs;
                draft.status = payload.status;
                draft.updated_at = Utc::now();
                draft.clone()
            }
            None => {
                let now = Utc::now();
                let draft = DraftRecord {
                    id: Uuid::new_v4(),
                    user_id,
                    report_type,
                    form_data: payload.form_data,
                    evidence_refs: payload.evidence_refs,
                    signature_refs: payload.signature_refs,
                    status: payload.status,
                    created_at: now,
                    updated_at: now,
                };
                drafts.insert(draft.id, draft.clone());
                draft
            }
        };
        Ok(record)
    }

    async fn insert(
        &self,
        user_id: Uuid,
        report_type: ReportType,
        payload: DraftPayload,
    ) -> Result<DraftRecord, AppError> {
        // Slot check and insert under one lock, matching the unique-index
        // guarantee of the Postgres implementation.
        let mut drafts = self.drafts.lock().unwrap();
        if payload.status == DraftStatus::Active
            && drafts.values().any(|d| {
                d.user_id == user_id
                    && d.report_type == report_type
                    && d.status == DraftStatus::Active
            })
        {
            return Err(AppError::Conflict(format!(
                "An active {report_type} draft already exists for this user"
            )));
        }

        let now = Utc::now();
        let draft = DraftRecord {
            id: Uuid::new_v4(),
            user_id,
            report_type,
            form_data: payload.form_data,
            evidence_refs: payload.evidence_refs,
            signature_refs: payload.signature_refs,
            status: payload.status,
            created_at: now,
            updated_at: now,
        };
        drafts.insert(draft.id, draft.clone());
        Ok(draft)
    }

    async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        payload: DraftPayload,
    ) -> Result<DraftRecord, AppError> {
        let mut drafts = self.drafts.lock().unwrap();
        let draft = drafts
            .get_mut(&id)
            .filter(|d| d.user_id == user_id)
            .ok_or_else(|| AppError::NotFound(format!("Draft not found: {}", id)))?;

        draft.form_data = payload.form_data;
        draft.evidence_refs = payload.evidence_refs;
        draft.signature_refs = payload.signature_refs;
        draft.status = payload.status;
        draft.updated_at = Utc::now();
        Ok(draft.clone())
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let mut drafts = self.drafts.lock().unwrap();
        let owned = drafts.get(&id).map(|d| d.user_id == user_id);
        match owned {
            Some(true) => {
                drafts.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Explorer over a shared [`MemoryLedger`], computing the same level
/// aggregations as the Postgres implementation.
pub struct MemoryExplorer {
    ledger: Arc<MemoryLedger>,
}

impl MemoryExplorer {
    pub fn new(ledger: Arc<MemoryLedger>) -> Arc<Self> {
        Arc::new(MemoryExplorer { ledger })
    }

    fn visible(record: &EvidenceRecord, scope: &ExplorerScope) -> bool {
        if record.status != EvidenceStatus::Confirmed || record.namespace != Namespace::Evidences {
            return false;
        }
        if let Some(slug) = &scope.subsystem_slug {
            if &record.subsystem_slug != slug {
                return false;
            }
        }
        if let Some(year) = scope.year {
            if record.evidence_date.year() != year {
                return false;
            }
        }
        if let Some(month) = scope.month {
            if record.evidence_date.month() != month {
                return false;
            }
        }
        if let Some(day) = scope.day {
            if record.evidence_date.day() != day {
                return false;
            }
        }
        if let Some(report_type) = scope.report_type {
            if record.report_type != report_type {
                return false;
            }
        }
        if let Some(report_id) = scope.report_id {
            if record.report_id != report_id {
                return false;
            }
        }
        true
    }

    fn fold_level(
        records: &[EvidenceRecord],
        label_of: impl Fn(&EvidenceRecord) -> String,
    ) -> Vec<ExplorerNode> {
        let mut counts: HashMap<String, i64> = HashMap::new();
        for record in records {
            *counts.entry(label_of(record)).or_insert(0) += 1;
        }
        let mut nodes: Vec<ExplorerNode> = counts
            .into_iter()
            .map(|(label, count)| ExplorerNode::folder(label, count))
            .collect();
        nodes.sort_by(|a, b| a.label.cmp(&b.label));
        nodes
    }
}

#[async_trait]
impl ExplorerIndex for MemoryExplorer {
    async fn list(&self, scope: &ExplorerScope) -> Result<Vec<ExplorerNode>, AppError> {
        let depth = scope.depth()?;
        let records: Vec<EvidenceRecord> = self
            .ledger
            .all()
            .into_iter()
            .filter(|r| Self::visible(r, scope))
            .collect();

        let nodes = match depth {
            ExplorerDepth::Subsystems => {
                Self::fold_level(&records, |r| r.subsystem_slug.clone())
            }
            ExplorerDepth::Years => {
                Self::fold_level(&records, |r| format!("{:04}", r.evidence_date.year()))
            }
            ExplorerDepth::Months => {
                Self::fold_level(&records, |r| format!("{:02}", r.evidence_date.month()))
            }
            ExplorerDepth::Days => {
                Self::fold_level(&records, |r| format!("{:02}", r.evidence_date.day()))
            }
            ExplorerDepth::ReportTypes => {
                Self::fold_level(&records, |r| r.report_type.to_string())
            }
            ExplorerDepth::Reports => {
                let mut grouped: HashMap<Uuid, (String, i64)> = HashMap::new();
                for record in &records {
                    let label = if record.report_folio.is_empty() {
                        record.report_id.to_string()
                    } else {
                        record.report_folio.clone()
                    };
                    grouped.entry(record.report_id).or_insert((label, 0)).1 += 1;
                }
                let mut nodes: Vec<ExplorerNode> = grouped
                    .into_iter()
                    .map(|(report_id, (label, count))| {
                        let mut node = ExplorerNode::folder(label, count);
                        node.report_id = Some(report_id);
                        node
                    })
                    .collect();
                nodes.sort_by(|a, b| a.label.cmp(&b.label));
                nodes
            }
            ExplorerDepth::Files => {
                let mut sorted = records;
                sorted.sort_by(|a, b| a.original_name.cmp(&b.original_name));
                sorted.iter().map(ExplorerNode::file).collect()
            }
        };
        Ok(nodes)
    }

    async fn search(
        &self,
        q: &str,
        scope: &ExplorerScope,
    ) -> Result<Vec<ExplorerNode>, AppError> {
        scope.depth()?;
        let needle = q.to_lowercase();
        let mut matching: Vec<EvidenceRecord> = self
            .ledger
            .all()
            .into_iter()
            .filter(|r| Self::visible(r, scope))
            .filter(|r| {
                r.original_name.to_lowercase().contains(&needle)
                    || r.report_folio.to_lowercase().contains(&needle)
            })
            .collect();
        matching.sort_by(|a, b| a.original_name.cmp(&b.original_name));
        Ok(matching.iter().map(ExplorerNode::file).collect())
    }
}

/// Report directory backed by a fixed map.
#[derive(Default)]
pub struct StaticReportDirectory {
    reports: Mutex<HashMap<(ReportType, Uuid), ReportContext>>,
}

impl StaticReportDirectory {
    pub fn new() -> Arc<Self> {
        Arc::new(StaticReportDirectory::default())
    }

    pub fn insert(&self, report_type: ReportType, report_id: Uuid, context: ReportContext) {
        self.reports
            .lock()
            .unwrap()
            .insert((report_type, report_id), context);
    }
}

#[async_trait]
impl ReportDirectory for StaticReportDirectory {
    async fn lookup(
        &self,
        report_type: ReportType,
        report_id: Uuid,
    ) -> Result<Option<ReportContext>, AppError> {
        Ok(self
            .reports
            .lock()
            .unwrap()
            .get(&(report_type, report_id))
            .cloned())
    }
}
