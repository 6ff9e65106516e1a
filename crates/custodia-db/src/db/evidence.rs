use async_trait::async_trait;
use chrono::{DateTime, Utc};
use custodia_core::models::evidence::{EvidenceRecord, EvidenceStatus, NewEvidence};
use custodia_core::repos::EvidenceLedger;
use custodia_core::{AppError, Namespace, ReportType};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

pub(crate) const EVIDENCE_COLUMNS: &str = "id, key, report_id, report_type, report_folio, original_name, \
     mime_type, size_bytes, subsystem, subsystem_slug, evidence_date, namespace, status, \
     created_at, confirmed_at";

/// Postgres-backed evidence ledger.
#[derive(Clone)]
pub struct PgEvidenceLedger {
    pool: PgPool,
}

impl PgEvidenceLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map a row onto an `EvidenceRecord`, decoding the TEXT-typed enum columns.
pub(crate) fn evidence_from_row(row: &PgRow) -> Result<EvidenceRecord, sqlx::Error> {
    let decode = |column: &str, value: &str| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: format!("unrecognized value '{value}'").into(),
    };

    let report_type: String = row.try_get("report_type")?;
    let namespace: String = row.try_get("namespace")?;
    let status: String = row.try_get("status")?;

    Ok(EvidenceRecord {
        id: row.try_get("id")?,
        key: row.try_get("key")?,
        report_id: row.try_get("report_id")?,
        report_type: ReportType::parse(&report_type)
            .ok_or_else(|| decode("report_type", &report_type))?,
        report_folio: row.try_get("report_folio")?,
        original_name: row.try_get("original_name")?,
        mime_type: row.try_get("mime_type")?,
        size_bytes: row.try_get("size_bytes")?,
        subsystem: row.try_get("subsystem")?,
        subsystem_slug: row.try_get("subsystem_slug")?,
        evidence_date: row.try_get("evidence_date")?,
        namespace: Namespace::parse(&namespace).ok_or_else(|| decode("namespace", &namespace))?,
        status: EvidenceStatus::parse(&status).ok_or_else(|| decode("status", &status))?,
        created_at: row.try_get("created_at")?,
        confirmed_at: row.try_get("confirmed_at")?,
    })
}

#[async_trait]
impl EvidenceLedger for PgEvidenceLedger {
    #[tracing::instrument(skip(self, evidence), fields(db.table = "evidence_records", db.operation = "insert", evidence_id = %evidence.id))]
    async fn insert_pending(&self, evidence: NewEvidence) -> Result<EvidenceRecord, AppError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO evidence_records (
                id, key, report_id, report_type, report_folio, original_name,
                mime_type, size_bytes, subsystem, subsystem_slug, evidence_date,
                namespace, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 'pending')
            RETURNING {EVIDENCE_COLUMNS}
            "#
        ))
        .bind(evidence.id)
        .bind(&evidence.key)
        .bind(evidence.report_id)
        .bind(evidence.report_type.as_str())
        .bind(&evidence.report_folio)
        .bind(&evidence.original_name)
        .bind(&evidence.mime_type)
        .bind(evidence.size_bytes)
        .bind(&evidence.subsystem)
        .bind(&evidence.subsystem_slug)
        .bind(evidence.evidence_date)
        .bind(evidence.namespace.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict(format!("Evidence key already exists: {}", evidence.key))
            }
            _ => AppError::from(e),
        })?;

        Ok(evidence_from_row(&row)?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<EvidenceRecord>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {EVIDENCE_COLUMNS} FROM evidence_records WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(evidence_from_row).transpose().map_err(AppError::from)
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<EvidenceRecord>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {EVIDENCE_COLUMNS} FROM evidence_records WHERE key = $1"
        ))
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(evidence_from_row).transpose().map_err(AppError::from)
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
        let row = sqlx::query(&format!(
            r#"
            SELECT {EVIDENCE_COLUMNS}
            FROM evidence_records
            WHERE report_id = $1
              AND namespace = $2
              AND report_type = $3
              AND original_name = $4
              AND size_bytes = $5
              AND status = 'pending'
              AND created_at >= $6
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .bind(report_id)
        .bind(namespace.as_str())
        .bind(report_type.as_str())
        .bind(original_name)
        .bind(size_bytes)
        .bind(issued_after)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(evidence_from_row).transpose().map_err(AppError::from)
    }

    /// The guarded UPDATE only wins the `pending -> confirmed` race once.
    /// When no row matches, a re-read disambiguates: already confirmed is
    /// idempotent success, orphaned is a conflict, missing is not found.
    #[tracing::instrument(skip(self), fields(db.table = "evidence_records", db.operation = "update"))]
    async fn mark_confirmed(&self, id: Uuid) -> Result<EvidenceRecord, AppError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE evidence_records
            SET status = 'confirmed', confirmed_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {EVIDENCE_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Ok(evidence_from_row(&row)?);
        }

        match self.find_by_id(id).await? {
            Some(record) if record.status == EvidenceStatus::Confirmed => Ok(record),
            Some(record) if record.status == EvidenceStatus::Orphaned => Err(AppError::Conflict(
                format!("Evidence {id} was orphaned and cannot be confirmed"),
            )),
            Some(_) => Err(AppError::Internal(format!(
                "Evidence {id} reverted to pending during confirmation"
            ))),
            None => Err(AppError::NotFound(format!("Evidence not found: {id}"))),
        }
    }

    #[tracing::instrument(skip(self), fields(db.table = "evidence_records", db.operation = "update"))]
    async fn mark_orphaned(&self, id: Uuid) -> Result<EvidenceRecord, AppError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE evidence_records
            SET status = 'orphaned'
            WHERE id = $1 AND status = 'pending'
            RETURNING {EVIDENCE_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(evidence_from_row(&row)?),
            None => match self.find_by_id(id).await? {
                Some(record) => Err(AppError::Conflict(format!(
                    "Evidence {id} is {} and cannot be orphaned",
                    record.status
                ))),
                None => Err(AppError::NotFound(format!("Evidence not found: {id}"))),
            },
        }
    }

    async fn list_by_report(
        &self,
        report_id: Uuid,
        include_pending: bool,
    ) -> Result<Vec<EvidenceRecord>, AppError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {EVIDENCE_COLUMNS}
            FROM evidence_records
            WHERE report_id = $1
              AND (status = 'confirmed' OR ($2 AND status = 'pending'))
            ORDER BY created_at ASC
            "#
        ))
        .bind(report_id)
        .bind(include_pending)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(|r| evidence_from_row(r).map_err(AppError::from)).collect()
    }

    async fn list_stale_pending(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<EvidenceRecord>, AppError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {EVIDENCE_COLUMNS}
            FROM evidence_records
            WHERE status = 'pending' AND created_at < $1
            ORDER BY created_at ASC
            "#
        ))
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(|r| evidence_from_row(r).map_err(AppError::from)).collect()
    }

    #[tracing::instrument(skip(self), fields(db.table = "evidence_records", db.operation = "update"))]
    async fn orphan_by_report(&self, report_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE evidence_records
            SET status = 'orphaned'
            WHERE report_id = $1 AND status != 'orphaned'
            "#,
        )
        .bind(report_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
