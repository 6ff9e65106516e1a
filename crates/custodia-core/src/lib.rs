//! Custodia Core Library
//!
//! This crate provides the domain models, error types, configuration,
//! validation, and key construction shared across all Custodia components,
//! plus the repository traits the storage and API crates implement.

pub mod config;
pub mod error;
pub mod keys;
pub mod models;
pub mod repos;
pub mod validation;

// Re-export commonly used types
pub use config::{Config, DraftConflictPolicy, StorageBackend};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use keys::{build_key, slugify, Namespace};
pub use models::report::ReportType;
pub use repos::{DraftStore, EvidenceLedger, ExplorerIndex, ReportDirectory};
pub use validation::{validate_upload, UploadLimits, ValidationError};
