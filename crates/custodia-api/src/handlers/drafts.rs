//! Draft autosave handlers.
//!
//! Autosave is a whole-document replace into the single active slot per
//! (user, report type). The slot policy is configurable: `replace` (default)
//! upserts last-writer-wins, `reject` surfaces a conflict when an active
//! draft already exists.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{response::IntoResponse, Json};
use custodia_core::models::draft::{DraftPayload, DraftRecord, DraftStatus};
use custodia_core::{AppError, DraftConflictPolicy, ReportType};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::UserContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

fn default_form_data() -> serde_json::Value {
    serde_json::json!({})
}

fn default_refs() -> serde_json::Value {
    serde_json::json!([])
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveDraftRequest {
    pub report_type: ReportType,
    #[serde(default = "default_form_data")]
    pub form_data: serde_json::Value,
    #[serde(default = "default_refs")]
    pub evidence_refs: serde_json::Value,
    #[serde(default = "default_refs")]
    pub signature_refs: serde_json::Value,
    #[serde(default)]
    pub status: Option<DraftStatus>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDraftRequest {
    #[serde(default = "default_form_data")]
    pub form_data: serde_json::Value,
    #[serde(default = "default_refs")]
    pub evidence_refs: serde_json::Value,
    #[serde(default = "default_refs")]
    pub signature_refs: serde_json::Value,
    #[serde(default)]
    pub status: Option<DraftStatus>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct GetDraftParams {
    pub report_type: ReportType,
}

/// Autosave the active draft for a report type
#[utoipa::path(
    post,
    path = "/drafts",
    tag = "drafts",
    request_body = SaveDraftRequest,
    responses(
        (status = 200, description = "Draft saved", body = DraftRecord),
        (status = 401, description = "Missing user identity", body = ErrorResponse),
        (status = 409, description = "Active draft exists and policy is reject", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(user_id = %user.user_id, report_type = %request.report_type))]
pub async fn save_draft(
    user: UserContext,
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<SaveDraftRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let payload = DraftPayload {
        form_data: request.form_data,
        evidence_refs: request.evidence_refs,
        signature_refs: request.signature_refs,
        status: request.status.unwrap_or(DraftStatus::Active),
    };

    // Under `reject` the store's atomic insert decides the conflict, so two
    // concurrent saves cannot both pass a pre-check and overwrite each other.
    let draft = match state.config.draft_conflict_policy {
        DraftConflictPolicy::Replace => {
            state
                .drafts
                .upsert(user.user_id, request.report_type, payload)
                .await?
        }
        DraftConflictPolicy::Reject => {
            state
                .drafts
                .insert(user.user_id, request.report_type, payload)
                .await?
        }
    };

    Ok(Json(draft))
}

/// Fetch the active draft for a report type
#[utoipa::path(
    get,
    path = "/drafts",
    tag = "drafts",
    params(GetDraftParams),
    responses(
        (status = 200, description = "Active draft", body = DraftRecord),
        (status = 404, description = "No active draft", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id, report_type = %params.report_type))]
pub async fn get_active_draft(
    user: UserContext,
    State(state): State<Arc<AppState>>,
    Query(params): Query<GetDraftParams>,
) -> Result<impl IntoResponse, HttpAppError> {
    let draft = state
        .drafts
        .get_active(user.user_id, params.report_type)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "No active {} draft for this user",
                params.report_type
            ))
        })?;

    Ok(Json(draft))
}

/// Replace a draft by id
#[utoipa::path(
    put,
    path = "/drafts/{id}",
    tag = "drafts",
    params(("id" = Uuid, Path, description = "Draft id")),
    request_body = UpdateDraftRequest,
    responses(
        (status = 200, description = "Draft replaced", body = DraftRecord),
        (status = 404, description = "Draft not found or owned by someone else", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(user_id = %user.user_id, draft_id = %id))]
pub async fn update_draft(
    user: UserContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateDraftRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let draft = state
        .drafts
        .update(
            id,
            user.user_id,
            DraftPayload {
                form_data: request.form_data,
                evidence_refs: request.evidence_refs,
                signature_refs: request.signature_refs,
                status: request.status.unwrap_or(DraftStatus::Active),
            },
        )
        .await?;

    Ok(Json(draft))
}

/// Delete a draft by id
#[utoipa::path(
    delete,
    path = "/drafts/{id}",
    tag = "drafts",
    params(("id" = Uuid, Path, description = "Draft id")),
    responses(
        (status = 204, description = "Draft deleted"),
        (status = 404, description = "Draft not found or owned by someone else", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id, draft_id = %id))]
pub async fn delete_draft(
    user: UserContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let deleted = state.drafts.delete(id, user.user_id).await?;
    if !deleted {
        return Err(HttpAppError(AppError::NotFound(format!(
            "Draft not found: {}",
            id
        ))));
    }

    Ok(StatusCode::NO_CONTENT)
}
