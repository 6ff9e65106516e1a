//! Custodia API Library
//!
//! HTTP surface, lifecycle services (presign broker, confirm reconciler,
//! orphan sweep), and application setup for the evidence storage pipeline.

mod api_doc;
mod handlers;
pub mod services;
pub mod setup;
pub mod telemetry;

// Public modules
pub mod auth;
pub mod error;
pub mod state;
pub mod test_helpers;

// Re-exports
pub use error::ErrorResponse;
pub use services::broker::PresignBroker;
pub use services::reconciler::ConfirmReconciler;
pub use services::sweep::OrphanSweep;
