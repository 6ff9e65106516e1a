//! Upload handshake integration tests: presign, direct object landing,
//! confirm, and presigned download, driven through the HTTP router against
//! the in-memory implementations.

mod helpers;

use axum::http::{Method, StatusCode};
use bytes::Bytes;
use chrono::NaiveDate;
use custodia_core::{EvidenceLedger, ReportType};
use custodia_storage::ObjectStorage;
use helpers::setup_test_app;
use serde_json::json;
use uuid::Uuid;

fn presign_body(report_id: Uuid, name: &str, size: u64) -> serde_json::Value {
    json!({
        "reportId": report_id,
        "reportType": "work",
        "originalName": name,
        "mimeType": "image/jpeg",
        "sizeBytes": size,
    })
}

#[tokio::test]
async fn test_presign_upload_confirm_download_round_trip() {
    let app = setup_test_app();
    let user = Uuid::new_v4();
    let report_id = app.seed_report(
        ReportType::Work,
        "Bombas de Agua",
        NaiveDate::from_ymd_opt(2024, 3, 7).unwrap(),
        "OT-2024-117",
    );

    // Presign
    let (status, body) = app
        .post(
            "/evidences/presign-upload",
            user,
            presign_body(report_id, "Fotografía Bomba #2.jpg", 2048),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let file_id: Uuid = body["fileId"].as_str().unwrap().parse().unwrap();
    let key = body["key"].as_str().unwrap().to_string();
    assert!(key.starts_with("evidences/work/bombas-de-agua/2024/03/07/"));
    assert!(key.contains(&format!("{}/", report_id)));
    assert!(key.ends_with(&format!("{}_fotografia-bomba-2.jpg", file_id)));
    assert!(body["upload"]["url"].as_str().unwrap().contains(&key));

    // The client uploads directly against the credentials; simulate the
    // object landing in storage.
    app.storage
        .put(&key, Bytes::from_static(b"jpeg bytes"), "image/jpeg")
        .await
        .unwrap();

    // Confirm
    let (status, body) = app
        .post("/evidences/confirm-upload", user, json!({ "fileId": file_id }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["evidence"]["status"], json!("confirmed"));
    assert_eq!(body["evidence"]["reportFolio"], json!("OT-2024-117"));

    // Download presign by file id
    let (status, body) = app
        .post(
            "/evidences/presign-download",
            user,
            json!({ "fileId": file_id }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["url"].as_str().unwrap().contains(&key));
    assert_eq!(body["expiresInSeconds"], json!(300));
}

#[tokio::test]
async fn test_confirm_is_idempotent() {
    let app = setup_test_app();
    let user = Uuid::new_v4();
    let report_id = app.seed_report(
        ReportType::Work,
        "Ventilación",
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        "OT-2024-201",
    );

    let (_, body) = app
        .post(
            "/evidences/presign-upload",
            user,
            presign_body(report_id, "antes.jpg", 100),
        )
        .await;
    let file_id: Uuid = body["fileId"].as_str().unwrap().parse().unwrap();
    let key = body["key"].as_str().unwrap().to_string();

    app.storage
        .put(&key, Bytes::from_static(b"x"), "image/jpeg")
        .await
        .unwrap();

    let (first, first_body) = app
        .post("/evidences/confirm-upload", user, json!({ "fileId": file_id }))
        .await;
    let (second, second_body) = app
        .post("/evidences/confirm-upload", user, json!({ "fileId": file_id }))
        .await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
    assert_eq!(
        first_body["evidence"]["confirmedAt"],
        second_body["evidence"]["confirmedAt"]
    );
}

#[tokio::test]
async fn test_confirm_before_object_lands_is_not_ready() {
    let app = setup_test_app();
    let user = Uuid::new_v4();
    let report_id = app.seed_report(
        ReportType::Work,
        "Bombas",
        NaiveDate::from_ymd_opt(2024, 3, 7).unwrap(),
        "OT-1",
    );

    let (_, body) = app
        .post(
            "/evidences/presign-upload",
            user,
            presign_body(report_id, "foto.jpg", 100),
        )
        .await;
    let file_id: Uuid = body["fileId"].as_str().unwrap().parse().unwrap();

    // Confirm without the object having landed.
    let (status, body) = app
        .post("/evidences/confirm-upload", user, json!({ "fileId": file_id }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], json!("NOT_READY"));
    assert_eq!(body["recoverable"], json!(true));

    // The record must stay pending so a later confirm can succeed.
    let record = app.ledger.find_by_id(file_id).await.unwrap().unwrap();
    assert_eq!(record.status.as_str(), "pending");
}

#[tokio::test]
async fn test_presign_retry_reuses_pending_record() {
    let app = setup_test_app();
    let user = Uuid::new_v4();
    let report_id = app.seed_report(
        ReportType::Work,
        "Bombas",
        NaiveDate::from_ymd_opt(2024, 3, 7).unwrap(),
        "OT-1",
    );

    let (_, first) = app
        .post(
            "/evidences/presign-upload",
            user,
            presign_body(report_id, "foto.jpg", 2048),
        )
        .await;
    let (_, second) = app
        .post(
            "/evidences/presign-upload",
            user,
            presign_body(report_id, "foto.jpg", 2048),
        )
        .await;

    // Same logical file: same id and key, no duplicate storage path.
    assert_eq!(first["fileId"], second["fileId"]);
    assert_eq!(first["key"], second["key"]);
    assert_eq!(app.ledger.all().len(), 1);

    // A different file gets its own record.
    let (_, third) = app
        .post(
            "/evidences/presign-upload",
            user,
            presign_body(report_id, "otra.jpg", 2048),
        )
        .await;
    assert_ne!(first["fileId"], third["fileId"]);
    assert_eq!(app.ledger.all().len(), 2);
}

#[tokio::test]
async fn test_presign_dedupe_is_scoped_to_namespace() {
    let app = setup_test_app();
    let user = Uuid::new_v4();
    let report_id = app.seed_report(
        ReportType::Work,
        "Bombas",
        NaiveDate::from_ymd_opt(2024, 3, 7).unwrap(),
        "OT-1",
    );

    // Same report, filename, and size, but a signature upload.
    let mut signature = presign_body(report_id, "firma.png", 2048);
    signature["mimeType"] = json!("image/png");
    signature["namespace"] = json!("signatures");
    let (_, first) = app
        .post("/evidences/presign-upload", user, signature)
        .await;

    let mut evidence = presign_body(report_id, "firma.png", 2048);
    evidence["mimeType"] = json!("image/png");
    let (_, second) = app
        .post("/evidences/presign-upload", user, evidence)
        .await;

    // Distinct files: the evidence presign must not be handed the
    // signature's record or its signatures/ key.
    assert_ne!(first["fileId"], second["fileId"]);
    assert!(first["key"].as_str().unwrap().starts_with("signatures/work/"));
    assert!(second["key"].as_str().unwrap().starts_with("evidences/work/"));
    assert_eq!(app.ledger.all().len(), 2);
}

#[tokio::test]
async fn test_presign_rejects_bad_metadata() {
    let app = setup_test_app();
    let user = Uuid::new_v4();
    let report_id = app.seed_report(
        ReportType::Work,
        "Bombas",
        NaiveDate::from_ymd_opt(2024, 3, 7).unwrap(),
        "OT-1",
    );

    // Unlisted MIME type
    let (status, body) = app
        .post(
            "/evidences/presign-upload",
            user,
            json!({
                "reportId": report_id,
                "reportType": "work",
                "originalName": "clip.mp4",
                "mimeType": "video/mp4",
                "sizeBytes": 100,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("VALIDATION_ERROR"));

    // Oversize declaration
    let (status, body) = app
        .post(
            "/evidences/presign-upload",
            user,
            presign_body(report_id, "enorme.jpg", 500 * 1024 * 1024),
        )
        .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["code"], json!("PAYLOAD_TOO_LARGE"));

    // No credential was issued and no record written for either.
    assert!(app.ledger.all().is_empty());
}

#[tokio::test]
async fn test_presign_unknown_report_is_not_found() {
    let app = setup_test_app();
    let user = Uuid::new_v4();

    let (status, body) = app
        .post(
            "/evidences/presign-upload",
            user,
            presign_body(Uuid::new_v4(), "foto.jpg", 100),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], json!("NOT_FOUND"));
}

#[tokio::test]
async fn test_presign_with_explicit_coordinates_skips_directory() {
    let app = setup_test_app();
    let user = Uuid::new_v4();
    // Warehouse staging: report not saved yet, coordinates supplied inline.
    let temp_report_id = Uuid::new_v4();

    let (status, body) = app
        .post(
            "/evidences/presign-upload",
            user,
            json!({
                "reportId": temp_report_id,
                "reportType": "warehouse",
                "originalName": "pieza.jpg",
                "mimeType": "image/jpeg",
                "sizeBytes": 512,
                "subsystem": "Almacén Central",
                "date": "2024-07-15",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let key = body["key"].as_str().unwrap();
    assert!(key.starts_with("evidences/warehouse/almacen-central/2024/07/15/"));
}

#[tokio::test]
async fn test_missing_user_header_is_unauthorized() {
    let app = setup_test_app();

    let (status, body) = app
        .request(
            Method::POST,
            "/evidences/presign-upload",
            None,
            Some(presign_body(Uuid::new_v4(), "foto.jpg", 100)),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], json!("UNAUTHORIZED"));
}

#[tokio::test]
async fn test_list_report_evidence_filters_pending() {
    let app = setup_test_app();
    let user = Uuid::new_v4();
    let report_id = app.seed_report(
        ReportType::Work,
        "Bombas",
        NaiveDate::from_ymd_opt(2024, 3, 7).unwrap(),
        "OT-1",
    );

    // One confirmed, one pending.
    for (name, confirm) in [("a.jpg", true), ("b.jpg", false)] {
        let (_, body) = app
            .post(
                "/evidences/presign-upload",
                user,
                presign_body(report_id, name, 100),
            )
            .await;
        if confirm {
            let key = body["key"].as_str().unwrap();
            let file_id = body["fileId"].as_str().unwrap();
            app.storage
                .put(key, Bytes::from_static(b"x"), "image/jpeg")
                .await
                .unwrap();
            app.post("/evidences/confirm-upload", user, json!({ "fileId": file_id }))
                .await;
        }
    }

    let (status, body) = app
        .get(&format!("/evidences/report/{}", report_id), user)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(1));

    let (status, body) = app
        .get(
            &format!("/evidences/report/{}?includePending=true", report_id),
            user,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(2));
}

#[tokio::test]
async fn test_void_report_orphans_all_records() {
    let app = setup_test_app();
    let user = Uuid::new_v4();
    let report_id = app.seed_report(
        ReportType::Work,
        "Bombas",
        NaiveDate::from_ymd_opt(2024, 3, 7).unwrap(),
        "OT-1",
    );

    let (_, body) = app
        .post(
            "/evidences/presign-upload",
            user,
            presign_body(report_id, "a.jpg", 100),
        )
        .await;
    let key = body["key"].as_str().unwrap();
    let file_id = body["fileId"].as_str().unwrap();
    app.storage
        .put(key, Bytes::from_static(b"x"), "image/jpeg")
        .await
        .unwrap();
    app.post("/evidences/confirm-upload", user, json!({ "fileId": file_id }))
        .await;

    let (status, body) = app
        .request(
            Method::DELETE,
            &format!("/evidences/report/{}", report_id),
            Some(user),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["orphaned"], json!(1));

    // The cascade marks records orphaned but never deletes objects.
    assert_eq!(app.storage.object_count(), 1);
    for record in app.ledger.all() {
        assert_eq!(record.status.as_str(), "orphaned");
    }
}
