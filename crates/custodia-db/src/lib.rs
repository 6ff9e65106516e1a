//! Custodia Database Library
//!
//! Postgres repositories implementing the custodia-core repository traits,
//! plus the schema migrations. All queries are dynamic sqlx queries so the
//! crate builds without a `DATABASE_URL`.

pub mod db;

pub use db::draft::PgDraftStore;
pub use db::evidence::PgEvidenceLedger;
pub use db::explorer::PgExplorerIndex;
pub use db::reports::PgReportDirectory;

/// Embedded migrations, applied at startup by the API setup.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
