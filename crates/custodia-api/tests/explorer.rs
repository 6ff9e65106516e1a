//! Explorer integration tests: one aggregated level per call, prefix-chain
//! scope validation, and scoped case-insensitive search.

mod helpers;

use axum::http::StatusCode;
use chrono::NaiveDate;
use custodia_core::models::evidence::NewEvidence;
use custodia_core::{build_key, slugify, EvidenceLedger, Namespace, ReportType};
use helpers::{setup_test_app, TestApp};
use serde_json::json;
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

struct Seed<'a> {
    subsystem: &'a str,
    date: NaiveDate,
    report_type: ReportType,
    report_id: Uuid,
    folio: &'a str,
    name: &'a str,
    confirm: bool,
}

async fn seed(app: &TestApp, s: Seed<'_>) -> Uuid {
    let file_id = Uuid::new_v4();
    let key = build_key(
        Namespace::Evidences,
        s.report_type,
        s.subsystem,
        s.date,
        s.report_id,
        file_id,
        s.name,
    )
    .unwrap();

    app.ledger
        .insert_pending(NewEvidence {
            id: file_id,
            key,
            report_id: s.report_id,
            report_type: s.report_type,
            report_folio: s.folio.to_string(),
            original_name: s.name.to_string(),
            mime_type: "image/jpeg".to_string(),
            size_bytes: 1024,
            subsystem: s.subsystem.to_string(),
            subsystem_slug: slugify(s.subsystem),
            evidence_date: s.date,
            namespace: Namespace::Evidences,
        })
        .await
        .unwrap();

    if s.confirm {
        app.ledger.mark_confirmed(file_id).await.unwrap();
    }
    file_id
}

/// Three confirmed 2024 files plus one confirmed 2023 file under "bombas",
/// one pending 2024 file that must never be counted, and one confirmed file
/// under a second subsystem.
async fn seed_hierarchy(app: &TestApp) -> (Uuid, Uuid) {
    let bombas_report = Uuid::new_v4();
    let molinos_report = Uuid::new_v4();

    for (d, name, confirm) in [
        (date(2024, 3, 7), "antes.jpg", true),
        (date(2024, 3, 7), "después.jpg", true),
        (date(2024, 6, 1), "válvula.jpg", true),
        (date(2024, 3, 7), "colgada.jpg", false),
    ] {
        seed(
            app,
            Seed {
                subsystem: "Bombas de Agua",
                date: d,
                report_type: ReportType::Work,
                report_id: bombas_report,
                folio: "OT-2024-117",
                name,
                confirm,
            },
        )
        .await;
    }

    seed(
        app,
        Seed {
            subsystem: "Bombas de Agua",
            date: date(2023, 11, 20),
            report_type: ReportType::Work,
            report_id: Uuid::new_v4(),
            folio: "OT-2023-890",
            name: "fuga.jpg",
            confirm: true,
        },
    )
    .await;

    seed(
        app,
        Seed {
            subsystem: "Molinos",
            date: date(2024, 3, 7),
            report_type: ReportType::Warehouse,
            report_id: molinos_report,
            folio: "ALM-44",
            name: "refacción.jpg",
            confirm: true,
        },
    )
    .await;

    (bombas_report, molinos_report)
}

#[tokio::test]
async fn test_root_lists_subsystems_with_confirmed_counts() {
    let app = setup_test_app();
    seed_hierarchy(&app).await;
    let user = Uuid::new_v4();

    let (status, body) = app.get("/explorer", user).await;
    assert_eq!(status, StatusCode::OK);

    let nodes = body.as_array().unwrap();
    assert_eq!(nodes.len(), 2);
    let bombas = nodes
        .iter()
        .find(|n| n["label"] == json!("bombas-de-agua"))
        .unwrap();
    assert_eq!(bombas["kind"], json!("folder"));
    // The pending record is invisible at every level.
    assert_eq!(bombas["count"], json!(4));
}

#[tokio::test]
async fn test_year_level_aggregates_and_excludes_pending() {
    let app = setup_test_app();
    seed_hierarchy(&app).await;
    let user = Uuid::new_v4();

    let (status, body) = app
        .get("/explorer?subsystemSlug=bombas-de-agua", user)
        .await;
    assert_eq!(status, StatusCode::OK);

    let nodes = body.as_array().unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0]["label"], json!("2023"));
    assert_eq!(nodes[0]["count"], json!(1));
    assert_eq!(nodes[1]["label"], json!("2024"));
    assert_eq!(nodes[1]["count"], json!(3));
}

#[tokio::test]
async fn test_descend_to_files() {
    let app = setup_test_app();
    let (bombas_report, _) = seed_hierarchy(&app).await;
    let user = Uuid::new_v4();

    let (_, months) = app
        .get("/explorer?subsystemSlug=bombas-de-agua&year=2024", user)
        .await;
    let months = months.as_array().unwrap();
    assert_eq!(months.len(), 2);
    assert_eq!(months[0]["label"], json!("03"));
    assert_eq!(months[0]["count"], json!(2));
    assert_eq!(months[1]["label"], json!("06"));

    let (_, days) = app
        .get(
            "/explorer?subsystemSlug=bombas-de-agua&year=2024&month=3",
            user,
        )
        .await;
    assert_eq!(days.as_array().unwrap()[0]["label"], json!("07"));

    let (_, report_types) = app
        .get(
            "/explorer?subsystemSlug=bombas-de-agua&year=2024&month=3&day=7",
            user,
        )
        .await;
    assert_eq!(report_types.as_array().unwrap()[0]["label"], json!("work"));

    let (_, reports) = app
        .get(
            "/explorer?subsystemSlug=bombas-de-agua&year=2024&month=3&day=7&reportType=work",
            user,
        )
        .await;
    let reports = reports.as_array().unwrap();
    assert_eq!(reports.len(), 1);
    // Report folders are labeled by folio and carry the id for descent.
    assert_eq!(reports[0]["label"], json!("OT-2024-117"));
    assert_eq!(reports[0]["reportId"], json!(bombas_report.to_string()));

    let (_, files) = app
        .get(
            &format!(
                "/explorer?subsystemSlug=bombas-de-agua&year=2024&month=3&day=7&reportType=work&reportId={}",
                bombas_report
            ),
            user,
        )
        .await;
    let files = files.as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0]["kind"], json!("file"));
    assert_eq!(files[0]["originalName"], json!("antes.jpg"));
    assert_eq!(files[1]["originalName"], json!("después.jpg"));
    assert!(files[0]["key"].as_str().unwrap().starts_with("evidences/"));
}

#[tokio::test]
async fn test_scope_gap_is_rejected() {
    let app = setup_test_app();
    let user = Uuid::new_v4();

    // Month without a year is meaningless in the hierarchy.
    let (status, body) = app
        .get("/explorer?subsystemSlug=bombas-de-agua&month=3", user)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("VALIDATION_ERROR"));
}

#[tokio::test]
async fn test_search_matches_filename_and_folio() {
    let app = setup_test_app();
    seed_hierarchy(&app).await;
    let user = Uuid::new_v4();

    // Case-insensitive filename match ("VÁLVULA", percent-encoded).
    let (status, body) = app.get("/explorer/search?q=V%C3%81LVULA", user).await;
    assert_eq!(status, StatusCode::OK);
    let hits = body.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["originalName"], json!("válvula.jpg"));

    // Folio match.
    let (_, body) = app.get("/explorer/search?q=ot-2023", user).await;
    let hits = body.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["reportFolio"], json!("OT-2023-890"));

    // Pending records never surface.
    let (_, body) = app.get("/explorer/search?q=colgada", user).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_search_respects_scope() {
    let app = setup_test_app();
    seed_hierarchy(&app).await;
    let user = Uuid::new_v4();

    // ".jpg" matches everything confirmed; scoping to molinos narrows it.
    let (_, body) = app.get("/explorer/search?q=.jpg", user).await;
    assert_eq!(body.as_array().unwrap().len(), 5);

    let (_, body) = app
        .get("/explorer/search?q=.jpg&subsystemSlug=molinos", user)
        .await;
    let hits = body.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["originalName"], json!("refacción.jpg"));
}

#[tokio::test]
async fn test_search_blank_query_rejected() {
    let app = setup_test_app();
    let user = Uuid::new_v4();

    let (status, body) = app.get("/explorer/search?q=%20%20", user).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("VALIDATION_ERROR"));
}
