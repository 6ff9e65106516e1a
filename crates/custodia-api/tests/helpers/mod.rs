//! Test helpers: build AppState and router over the in-memory
//! implementations, plus request plumbing for driving the router directly.

// Each test binary compiles this module separately and uses a subset of it.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use custodia_api::setup::routes::api_router;
use custodia_api::state::AppState;
use custodia_api::test_helpers::{
    test_config, MemoryDraftStore, MemoryExplorer, MemoryLedger, StaticReportDirectory,
};
use custodia_core::models::report::ReportContext;
use custodia_core::{Config, ReportType};
use custodia_storage::MemoryStorage;
use tower::ServiceExt;
use uuid::Uuid;

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub ledger: Arc<MemoryLedger>,
    pub drafts: Arc<MemoryDraftStore>,
    pub storage: MemoryStorage,
    pub reports: Arc<StaticReportDirectory>,
}

pub fn setup_test_app() -> TestApp {
    setup_test_app_with(test_config())
}

pub fn setup_test_app_with(config: Config) -> TestApp {
    let ledger = MemoryLedger::new();
    let drafts = MemoryDraftStore::new();
    let explorer = MemoryExplorer::new(ledger.clone());
    let reports = StaticReportDirectory::new();
    let storage = MemoryStorage::new("custodia-test");

    let state = Arc::new(AppState::new(
        config,
        Arc::new(storage.clone()),
        ledger.clone(),
        drafts.clone(),
        explorer,
        reports.clone(),
    ));

    TestApp {
        router: api_router(state.clone()),
        state,
        ledger,
        drafts,
        storage,
        reports,
    }
}

impl TestApp {
    /// Register a report the directory can resolve, returning its id.
    pub fn seed_report(
        &self,
        report_type: ReportType,
        subsystem: &str,
        date: NaiveDate,
        folio: &str,
    ) -> Uuid {
        let report_id = Uuid::new_v4();
        self.reports.insert(
            report_type,
            report_id,
            ReportContext {
                subsystem: subsystem.to_string(),
                date,
                folio: folio.to_string(),
            },
        );
        report_id
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        user: Option<Uuid>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(user_id) = user {
            builder = builder.header("X-User-Id", user_id.to_string());
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, json)
    }

    pub async fn post(
        &self,
        path: &str,
        user: Uuid,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        self.request(Method::POST, path, Some(user), Some(body)).await
    }

    pub async fn get(&self, path: &str, user: Uuid) -> (StatusCode, serde_json::Value) {
        self.request(Method::GET, path, Some(user), None).await
    }
}
