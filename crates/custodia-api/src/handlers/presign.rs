//! Presign and confirm handlers: the three-step upload handshake.

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use custodia_core::models::presign::{
    ConfirmUploadRequest, ConfirmUploadResponse, PresignDownloadRequest, PresignDownloadResponse,
    PresignUploadRequest, PresignUploadResponse,
};

use crate::auth::UserContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::services::broker::PresignBroker;
use crate::services::reconciler::ConfirmReconciler;
use crate::state::AppState;

fn broker(state: &AppState) -> PresignBroker {
    PresignBroker::new(
        state.ledger.clone(),
        state.reports.clone(),
        state.storage.clone(),
        state.config.clone(),
        state.retry_policy(),
    )
}

/// Issue presigned upload credentials for one evidence file
#[utoipa::path(
    post,
    path = "/evidences/presign-upload",
    tag = "evidences",
    request_body = PresignUploadRequest,
    responses(
        (status = 200, description = "Upload credentials issued", body = PresignUploadResponse),
        (status = 400, description = "Invalid metadata", body = ErrorResponse),
        (status = 404, description = "Owning report not found", body = ErrorResponse),
        (status = 413, description = "Declared size exceeds limit", body = ErrorResponse),
        (status = 502, description = "Object store unavailable", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(user_id = %user.user_id))]
pub async fn presign_upload(
    user: UserContext,
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<PresignUploadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let response = broker(&state).presign_upload(request).await?;
    Ok(Json(response))
}

/// Confirm that an uploaded object has landed in storage
#[utoipa::path(
    post,
    path = "/evidences/confirm-upload",
    tag = "evidences",
    request_body = ConfirmUploadRequest,
    responses(
        (status = 200, description = "Evidence confirmed", body = ConfirmUploadResponse),
        (status = 404, description = "Unknown file id", body = ErrorResponse),
        (status = 409, description = "Object not visible yet, or record orphaned", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(user_id = %user.user_id, file_id = %request.file_id))]
pub async fn confirm_upload(
    user: UserContext,
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<ConfirmUploadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let reconciler = ConfirmReconciler::new(
        state.ledger.clone(),
        state.storage.clone(),
        state.retry_policy(),
    );
    let evidence = reconciler.confirm(request.file_id).await?;
    Ok(Json(ConfirmUploadResponse {
        success: true,
        evidence: Some(evidence),
    }))
}

/// Issue a short-lived download URL for a ledger id or raw key
#[utoipa::path(
    post,
    path = "/evidences/presign-download",
    tag = "evidences",
    request_body = PresignDownloadRequest,
    responses(
        (status = 200, description = "Download URL issued", body = PresignDownloadResponse),
        (status = 400, description = "Neither or both of fileId/key given", body = ErrorResponse),
        (status = 404, description = "Unknown file id", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(user_id = %user.user_id))]
pub async fn presign_download(
    user: UserContext,
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<PresignDownloadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let response = broker(&state).presign_download(request).await?;
    Ok(Json(response))
}
