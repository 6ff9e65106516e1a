//! Domain models shared across Custodia components.

pub mod draft;
pub mod evidence;
pub mod explorer;
pub mod presign;
pub mod report;

pub use draft::{DraftPayload, DraftRecord, DraftStatus};
pub use evidence::{EvidenceRecord, EvidenceStatus, NewEvidence};
pub use explorer::{ExplorerDepth, ExplorerNode, ExplorerNodeKind, ExplorerScope};
pub use presign::{
    ConfirmUploadRequest, ConfirmUploadResponse, PresignDownloadRequest, PresignDownloadResponse,
    PresignUploadRequest, PresignUploadResponse, UploadCredentials,
};
pub use report::{ReportContext, ReportType};
