//! OpenAPI documentation, served at `/api/openapi.json`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use custodia_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Custodia API",
        version = "0.1.0",
        description = "Field evidence storage pipeline: presigned direct-to-storage uploads \
                       with a confirm handshake, report-scoped evidence listings, draft \
                       autosave, and a hierarchical evidence explorer."
    ),
    paths(
        // Upload handshake
        handlers::presign::presign_upload,
        handlers::presign::confirm_upload,
        handlers::presign::presign_download,
        // Report-scoped evidence
        handlers::evidence::list_report_evidence,
        handlers::evidence::void_report_evidence,
        // Explorer
        handlers::explorer::list_explorer,
        handlers::explorer::search_explorer,
        // Drafts
        handlers::drafts::save_draft,
        handlers::drafts::get_active_draft,
        handlers::drafts::update_draft,
        handlers::drafts::delete_draft,
    ),
    components(schemas(
        error::ErrorResponse,
        models::evidence::EvidenceRecord,
        models::evidence::EvidenceStatus,
        models::report::ReportType,
        models::draft::DraftRecord,
        models::draft::DraftStatus,
        models::explorer::ExplorerNode,
        models::explorer::ExplorerNodeKind,
        models::presign::PresignUploadRequest,
        models::presign::PresignUploadResponse,
        models::presign::UploadCredentials,
        models::presign::ConfirmUploadRequest,
        models::presign::ConfirmUploadResponse,
        models::presign::PresignDownloadRequest,
        models::presign::PresignDownloadResponse,
        handlers::evidence::ReportEvidenceResponse,
        handlers::evidence::VoidReportResponse,
        handlers::drafts::SaveDraftRequest,
        handlers::drafts::UpdateDraftRequest,
        custodia_core::keys::Namespace,
    )),
    tags(
        (name = "evidences", description = "Presigned upload handshake and report-scoped evidence"),
        (name = "explorer", description = "Hierarchical evidence browsing and search"),
        (name = "drafts", description = "Report draft autosave")
    )
)]
pub struct ApiDoc;
