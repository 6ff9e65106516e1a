//! HTTP handlers, grouped by domain.

pub mod drafts;
pub mod evidence;
pub mod explorer;
pub mod presign;
