use async_trait::async_trait;
use custodia_core::models::draft::{DraftPayload, DraftRecord, DraftStatus};
use custodia_core::repos::DraftStore;
use custodia_core::{AppError, ReportType};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

const DRAFT_COLUMNS: &str = "id, user_id, report_type, form_data, evidence_refs, \
     signature_refs, status, created_at, updated_at";

/// Postgres-backed draft autosave store.
#[derive(Clone)]
pub struct PgDraftStore {
    pool: PgPool,
}

impl PgDraftStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn draft_from_row(row: &PgRow) -> Result<DraftRecord, sqlx::Error> {
    let decode = |column: &str, value: &str| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: format!("unrecognized value '{value}'").into(),
    };

    let report_type: String = row.try_get("report_type")?;
    let status: String = row.try_get("status")?;

    Ok(DraftRecord {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        report_type: ReportType::parse(&report_type)
            .ok_or_else(|| decode("report_type", &report_type))?,
        form_data: row.try_get("form_data")?,
        evidence_refs: row.try_get("evidence_refs")?,
        signature_refs: row.try_get("signature_refs")?,
        status: DraftStatus::parse(&status).ok_or_else(|| decode("status", &status))?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl DraftStore for PgDraftStore {
    async fn get_active(
        &self,
        user_id: Uuid,
        report_type: ReportType,
    ) -> Result<Option<DraftRecord>, AppError> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {DRAFT_COLUMNS}
            FROM report_drafts
            WHERE user_id = $1 AND report_type = $2 AND status = 'active'
            "#
        ))
        .bind(user_id)
        .bind(report_type.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(draft_from_row).transpose().map_err(AppError::from)
    }

    /// Upsert against the partial unique index on the active slot, so two
    /// concurrent autosaves converge on one row instead of racing an insert.
    #[tracing::instrument(skip(self, payload), fields(db.table = "report_drafts", db.operation = "upsert"))]
    async fn upsert(
        &self,
        user_id: Uuid,
        report_type: ReportType,
        payload: DraftPayload,
    ) -> Result<DraftRecord, AppError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO report_drafts (user_id, report_type, form_data, evidence_refs, signature_refs, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, report_type) WHERE status = 'active'
            DO UPDATE SET
                form_data = EXCLUDED.form_data,
                evidence_refs = EXCLUDED.evidence_refs,
                signature_refs = EXCLUDED.signature_refs,
                status = EXCLUDED.status,
                updated_at = NOW()
            RETURNING {DRAFT_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(report_type.as_str())
        .bind(&payload.form_data)
        .bind(&payload.evidence_refs)
        .bind(&payload.signature_refs)
        .bind(payload.status.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(draft_from_row(&row)?)
    }

    /// Plain insert for the `reject` conflict policy: the partial unique
    /// index on the active slot turns a concurrent duplicate into a unique
    /// violation, surfaced as `Conflict`.
    #[tracing::instrument(skip(self, payload), fields(db.table = "report_drafts", db.operation = "insert"))]
    async fn insert(
        &self,
        user_id: Uuid,
        report_type: ReportType,
        payload: DraftPayload,
    ) -> Result<DraftRecord, AppError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO report_drafts (user_id, report_type, form_data, evidence_refs, signature_refs, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {DRAFT_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(report_type.as_str())
        .bind(&payload.form_data)
        .bind(&payload.evidence_refs)
        .bind(&payload.signature_refs)
        .bind(payload.status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(
                format!("An active {report_type} draft already exists for this user"),
            ),
            _ => AppError::from(e),
        })?;

        Ok(draft_from_row(&row)?)
    }

    #[tracing::instrument(skip(self, payload), fields(db.table = "report_drafts", db.operation = "update"))]
    async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        payload: DraftPayload,
    ) -> Result<DraftRecord, AppError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE report_drafts
            SET form_data = $3,
                evidence_refs = $4,
                signature_refs = $5,
                status = $6,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {DRAFT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(&payload.form_data)
        .bind(&payload.evidence_refs)
        .bind(&payload.signature_refs)
        .bind(payload.status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(draft_from_row(&row)?),
            None => Err(AppError::NotFound(format!("Draft not found: {id}"))),
        }
    }

    #[tracing::instrument(skip(self), fields(db.table = "report_drafts", db.operation = "delete"))]
    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM report_drafts WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
