use async_trait::async_trait;
use custodia_core::repos::ReportDirectory;
use custodia_core::{models::report::ReportContext, AppError, ReportType};
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Read-only view onto the externally-owned report tables. Evidence storage
/// never writes these; it only resolves the hierarchy coordinates of an
/// owning report at presign time.
#[derive(Clone)]
pub struct PgReportDirectory {
    pool: PgPool,
}

impl PgReportDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportDirectory for PgReportDirectory {
    #[tracing::instrument(skip(self), fields(db.operation = "select"))]
    async fn lookup(
        &self,
        report_type: ReportType,
        report_id: Uuid,
    ) -> Result<Option<ReportContext>, AppError> {
        let table = match report_type {
            ReportType::Work => "work_reports",
            ReportType::Warehouse => "warehouse_reports",
        };

        let row = sqlx::query(&format!(
            "SELECT subsystem, report_date, folio FROM {table} WHERE id = $1"
        ))
        .bind(report_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(ReportContext {
                subsystem: row.try_get("subsystem")?,
                date: row.try_get("report_date")?,
                folio: row.try_get("folio")?,
            })),
            None => Ok(None),
        }
    }
}
