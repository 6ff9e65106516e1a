//! Evidence explorer: lazy hierarchy listings and scoped search.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::{response::IntoResponse, Json};
use custodia_core::models::explorer::{ExplorerNode, ExplorerScope};
use custodia_core::{AppError, ReportType};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::auth::UserContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

/// List one level of the evidence hierarchy
///
/// The level returned is one deeper than the most specific scope parameter
/// supplied: no parameters lists subsystems, `subsystemSlug` lists years,
/// and so on down to leaf files under a report.
#[utoipa::path(
    get,
    path = "/explorer",
    tag = "explorer",
    params(ExplorerScope),
    responses(
        (status = 200, description = "Nodes one level below the scope", body = [ExplorerNode]),
        (status = 400, description = "Scope parameters do not form a prefix", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, scope), fields(user_id = %user.user_id))]
pub async fn list_explorer(
    user: UserContext,
    State(state): State<Arc<AppState>>,
    Query(scope): Query<ExplorerScope>,
) -> Result<impl IntoResponse, HttpAppError> {
    let nodes = state.explorer.list(&scope).await?;
    Ok(Json(nodes))
}

/// Query-string shape for `/explorer/search`: the scope coordinates plus
/// the search term. Kept flat because nested query encodings are not
/// expressible in a browser URL bar.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Case-insensitive substring matched on filename or report folio.
    pub q: String,
    pub subsystem_slug: Option<String>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub report_type: Option<ReportType>,
    pub report_id: Option<Uuid>,
}

impl SearchParams {
    fn scope(&self) -> ExplorerScope {
        ExplorerScope {
            subsystem_slug: self.subsystem_slug.clone(),
            year: self.year,
            month: self.month,
            day: self.day,
            report_type: self.report_type,
            report_id: self.report_id,
        }
    }
}

/// Search confirmed evidence by filename or folio within a scope
#[utoipa::path(
    get,
    path = "/explorer/search",
    tag = "explorer",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching leaf file nodes", body = [ExplorerNode]),
        (status = 400, description = "Blank query or invalid scope", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, params), fields(user_id = %user.user_id))]
pub async fn search_explorer(
    user: UserContext,
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, HttpAppError> {
    if params.q.trim().is_empty() {
        return Err(HttpAppError(AppError::Validation(
            "Search query must not be blank".to_string(),
        )));
    }

    let nodes = state.explorer.search(params.q.trim(), &params.scope()).await?;
    Ok(Json(nodes))
}
