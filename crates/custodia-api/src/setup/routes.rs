//! Route configuration and setup.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use custodia_core::Config;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::api_doc::ApiDoc;
use crate::handlers;
use crate::state::AppState;
use utoipa::OpenApi;

/// Confirm bodies and draft documents are small; upload bytes never transit
/// this service, so the request body limit can stay tight.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(config)?;

    let app = api_router(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

/// The bare API router without middleware layers. Integration tests drive
/// this directly against in-memory state.
pub fn api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/evidences/presign-upload",
            post(handlers::presign::presign_upload),
        )
        .route(
            "/evidences/confirm-upload",
            post(handlers::presign::confirm_upload),
        )
        .route(
            "/evidences/presign-download",
            post(handlers::presign::presign_download),
        )
        .route(
            "/evidences/report/{report_id}",
            get(handlers::evidence::list_report_evidence)
                .delete(handlers::evidence::void_report_evidence),
        )
        .route("/explorer", get(handlers::explorer::list_explorer))
        .route(
            "/explorer/search",
            get(handlers::explorer::search_explorer),
        )
        .route(
            "/drafts",
            post(handlers::drafts::save_draft).get(handlers::drafts::get_active_draft),
        )
        .route("/drafts/{id}", put(handlers::drafts::update_draft))
        .route("/drafts/{id}", delete(handlers::drafts::delete_draft))
        .route("/health", get(health_check))
        .route("/api/openapi.json", get(openapi_spec))
        .with_state(state)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins.contains(&"*".to_string()) {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers(Any)
    } else {
        let origins: Result<Vec<HeaderValue>, _> =
            config.cors_origins.iter().map(|o| o.parse()).collect();
        CorsLayer::new()
            .allow_origin(origins.unwrap_or_default())
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers(Any)
    };
    Ok(cors)
}

async fn openapi_spec() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

#[derive(serde::Serialize)]
struct HealthCheckResponse {
    status: String,
    storage: String,
}

/// Liveness plus a bounded storage probe. The probe key never exists; only
/// the backend answering at all matters here.
async fn health_check(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
) -> impl IntoResponse {
    const TIMEOUT: Duration = Duration::from_secs(5);

    let storage = state.storage.clone();
    let storage_status = match tokio::time::timeout(
        TIMEOUT,
        storage.exists("health-check-non-existent-key"),
    )
    .await
    {
        Ok(Ok(_)) => "healthy".to_string(),
        Ok(Err(e)) => format!("degraded: {}", e),
        Err(_) => "timeout".to_string(),
    };

    let overall_healthy = storage_status == "healthy";
    let response = HealthCheckResponse {
        status: if overall_healthy {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        storage: storage_status,
    };

    let status_code = if overall_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}
