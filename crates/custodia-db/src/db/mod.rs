//! Database repositories for the data access layer.
//!
//! Each repository owns one domain entity: the evidence ledger, the draft
//! store, the explorer read path, and the (read-only) report directory.

pub mod draft;
pub mod evidence;
pub mod explorer;
pub mod reports;
