use async_trait::async_trait;
use custodia_core::models::explorer::{ExplorerDepth, ExplorerNode, ExplorerScope};
use custodia_core::repos::ExplorerIndex;
use custodia_core::AppError;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row};
use uuid::Uuid;

use crate::db::evidence::{evidence_from_row, EVIDENCE_COLUMNS};

/// Scope constraint shared by every explorer query. Placeholders $1..$6 are
/// the scope coordinates in prefix order; a NULL coordinate matches all.
/// Only confirmed evidence in the `evidences` namespace is ever surfaced.
const SCOPE_FILTER: &str = "status = 'confirmed' AND namespace = 'evidences' \
     AND ($1::text IS NULL OR subsystem_slug = $1) \
     AND ($2::int IS NULL OR EXTRACT(YEAR FROM evidence_date)::int = $2) \
     AND ($3::int IS NULL OR EXTRACT(MONTH FROM evidence_date)::int = $3) \
     AND ($4::int IS NULL OR EXTRACT(DAY FROM evidence_date)::int = $4) \
     AND ($5::text IS NULL OR report_type = $5) \
     AND ($6::uuid IS NULL OR report_id = $6)";

const SEARCH_LIMIT: i64 = 100;

/// Postgres-backed explorer read path. Every level is one aggregation over
/// `evidence_records`; nothing about the hierarchy is stored.
#[derive(Clone)]
pub struct PgExplorerIndex {
    pool: PgPool,
}

impl PgExplorerIndex {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn bind_scope<'q>(
    query: Query<'q, Postgres, PgArguments>,
    scope: &'q ExplorerScope,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(scope.subsystem_slug.as_deref())
        .bind(scope.year)
        .bind(scope.month.map(|m| m as i32))
        .bind(scope.day.map(|d| d as i32))
        .bind(scope.report_type.map(|t| t.as_str()))
        .bind(scope.report_id)
}

/// Escape `%`, `_`, and `\` so user input matches literally under ILIKE.
fn escape_like(q: &str) -> String {
    q.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

#[async_trait]
impl ExplorerIndex for PgExplorerIndex {
    #[tracing::instrument(skip(self, scope), fields(db.table = "evidence_records", db.operation = "select"))]
    async fn list(&self, scope: &ExplorerScope) -> Result<Vec<ExplorerNode>, AppError> {
        let depth = scope.depth()?;

        let label_expr = match depth {
            ExplorerDepth::Subsystems => "subsystem_slug",
            ExplorerDepth::Years => "TO_CHAR(evidence_date, 'YYYY')",
            ExplorerDepth::Months => "TO_CHAR(evidence_date, 'MM')",
            ExplorerDepth::Days => "TO_CHAR(evidence_date, 'DD')",
            ExplorerDepth::ReportTypes => "report_type",
            ExplorerDepth::Reports => {
                // Report folders keep their id so the client can descend;
                // the folio is the label, falling back to the id.
                let sql = format!(
                    r#"
                    SELECT report_id, COALESCE(NULLIF(report_folio, ''), report_id::text) AS label,
                           COUNT(*) AS count
                    FROM evidence_records
                    WHERE {SCOPE_FILTER}
                    GROUP BY report_id, 2
                    ORDER BY 2 ASC
                    "#
                );
                let rows = bind_scope(sqlx::query(&sql), scope).fetch_all(&self.pool).await?;

                return rows
                    .iter()
                    .map(|row| {
                        let label: String = row.try_get("label")?;
                        let count: i64 = row.try_get("count")?;
                        let report_id: Uuid = row.try_get("report_id")?;
                        let mut node = ExplorerNode::folder(label, count);
                        node.report_id = Some(report_id);
                        Ok(node)
                    })
                    .collect::<Result<Vec<_>, sqlx::Error>>()
                    .map_err(AppError::from);
            }
            ExplorerDepth::Files => {
                let sql = format!(
                    "SELECT {EVIDENCE_COLUMNS} FROM evidence_records \
                     WHERE {SCOPE_FILTER} ORDER BY original_name ASC"
                );
                let rows = bind_scope(sqlx::query(&sql), scope).fetch_all(&self.pool).await?;

                return rows
                    .iter()
                    .map(|row| Ok(ExplorerNode::file(&evidence_from_row(row)?)))
                    .collect::<Result<Vec<_>, sqlx::Error>>()
                    .map_err(AppError::from);
            }
        };

        let sql = format!(
            "SELECT {label_expr} AS label, COUNT(*) AS count FROM evidence_records \
             WHERE {SCOPE_FILTER} GROUP BY 1 ORDER BY 1 ASC"
        );
        let rows = bind_scope(sqlx::query(&sql), scope).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| {
                let label: String = row.try_get("label")?;
                let count: i64 = row.try_get("count")?;
                Ok(ExplorerNode::folder(label, count))
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(AppError::from)
    }

    #[tracing::instrument(skip(self, scope), fields(db.table = "evidence_records", db.operation = "select"))]
    async fn search(
        &self,
        q: &str,
        scope: &ExplorerScope,
    ) -> Result<Vec<ExplorerNode>, AppError> {
        scope.depth()?;

        let pattern = format!("%{}%", escape_like(q));
        let sql = format!(
            r#"
            SELECT {EVIDENCE_COLUMNS}
            FROM evidence_records
            WHERE {SCOPE_FILTER}
              AND (original_name ILIKE $7 OR report_folio ILIKE $7)
            ORDER BY original_name ASC
            LIMIT {SEARCH_LIMIT}
            "#
        );
        let rows = bind_scope(sqlx::query(&sql), scope)
            .bind(&pattern)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| Ok(ExplorerNode::file(&evidence_from_row(row)?)))
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(AppError::from)
    }
}
