//! Report-scoped evidence listings and the void cascade.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::{response::IntoResponse, Json};
use custodia_core::models::evidence::EvidenceRecord;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::UserContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListEvidenceParams {
    /// Include still-pending records (form re-entry after an interrupted
    /// upload). Defaults to false: confirmed evidence only.
    #[serde(default)]
    pub include_pending: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportEvidenceResponse {
    pub report_id: Uuid,
    pub count: usize,
    pub evidences: Vec<EvidenceRecord>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoidReportResponse {
    pub report_id: Uuid,
    pub orphaned: u64,
}

/// List the evidence attached to one report
#[utoipa::path(
    get,
    path = "/evidences/report/{report_id}",
    tag = "evidences",
    params(
        ("report_id" = Uuid, Path, description = "Owning report id"),
        ListEvidenceParams
    ),
    responses(
        (status = 200, description = "Evidence for the report", body = ReportEvidenceResponse),
        (status = 401, description = "Missing user identity", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id, report_id = %report_id))]
pub async fn list_report_evidence(
    user: UserContext,
    State(state): State<Arc<AppState>>,
    Path(report_id): Path<Uuid>,
    Query(params): Query<ListEvidenceParams>,
) -> Result<impl IntoResponse, HttpAppError> {
    let evidences = state
        .ledger
        .list_by_report(report_id, params.include_pending)
        .await?;

    Ok(Json(ReportEvidenceResponse {
        report_id,
        count: evidences.len(),
        evidences,
    }))
}

/// Orphan all evidence of a voided report
///
/// Soft cascade: the records are marked `orphaned` so listings and the
/// explorer stop surfacing them. Objects are never deleted here.
#[utoipa::path(
    delete,
    path = "/evidences/report/{report_id}",
    tag = "evidences",
    params(("report_id" = Uuid, Path, description = "Voided report id")),
    responses(
        (status = 200, description = "Cascade applied", body = VoidReportResponse),
        (status = 401, description = "Missing user identity", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id, report_id = %report_id))]
pub async fn void_report_evidence(
    user: UserContext,
    State(state): State<Arc<AppState>>,
    Path(report_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let orphaned = state.ledger.orphan_by_report(report_id).await?;

    tracing::info!(orphaned, "Orphaned evidence for voided report");

    Ok(Json(VoidReportResponse {
        report_id,
        orphaned,
    }))
}
