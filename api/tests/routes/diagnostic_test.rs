use axum::http::StatusCode;
use serde_json::json;
use serial_test::serial;
use services::DataProvider;
use services::providers::DatabaseProvider;
use services::types::{ClientInfo, DeviceType, DiagnosticResult, NewDevice};
use tower::ServiceExt;

use crate::helpers::app::{ctx, get_json_body, make_test_app, request, sign_up};

#[tokio::test]
#[serial]
async fn history_pages_through_the_callers_records() {
    let app = make_test_app().await;
    let session = sign_up(&app.db, "history@shop.example").await;
    let provider = DatabaseProvider::new(app.db.clone());
    let device = provider
        .create_device(&ctx(&session), &NewDevice::named("Bench PC", DeviceType::Desktop))
        .await
        .unwrap();
    for _ in 0..12 {
        let record = DiagnosticResult::pending(&device.id, &session.user.id, &ClientInfo::default());
        provider.save_diagnostic(&ctx(&session), &record).await.unwrap();
    }

    let response = app
        .router
        .clone()
        .oneshot(request(
            "GET",
            "/api/v1/diagnostic/history/?page=3&limit=5",
            Some(&session.access_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_json_body(response).await;
    let page = &json["data"];
    assert_eq!(page["total"], 12);
    assert_eq!(page["pages"], 3);
    assert_eq!(page["page"], 3);
    assert_eq!(page["data"].as_array().unwrap().len(), 2);

    let beyond = app
        .router
        .clone()
        .oneshot(request(
            "GET",
            "/api/v1/diagnostic/history/?page=18446744073709551615&limit=5",
            Some(&session.access_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(beyond.status(), StatusCode::OK);
    let json = get_json_body(beyond).await;
    assert_eq!(json["data"]["total"], 12);
    assert_eq!(json["data"]["data"].as_array().unwrap().len(), 0);

    let filtered = app
        .router
        .oneshot(request(
            "GET",
            "/api/v1/diagnostic/history?status=completed",
            Some(&session.access_token),
            None,
        ))
        .await
        .unwrap();
    let json = get_json_body(filtered).await;
    assert_eq!(json["data"]["total"], 0);
    assert_eq!(json["data"]["pages"], 0);
}

#[tokio::test]
#[serial]
async fn full_run_completes_and_links_the_device() {
    let app = make_test_app().await;
    let session = sign_up(&app.db, "full@shop.example").await;
    let provider = DatabaseProvider::new(app.db.clone());
    let device = provider
        .create_device(&ctx(&session), &NewDevice::named("Server", DeviceType::Desktop))
        .await
        .unwrap();

    let response = app
        .router
        .oneshot(request(
            "POST",
            "/api/v1/diagnostic/full",
            Some(&session.access_token),
            Some(json!({ "device_id": device.id, "client_name": "Sipho" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = get_json_body(response).await;
    let result = &json["data"];
    assert_eq!(result["status"], "completed");
    assert_eq!(result["client_name"], "Sipho");
    let score = result["health_score"].as_u64().unwrap();
    assert!(score <= 100);
    assert!(result["cpu"]["metrics"].is_object());

    let device = provider.get_device(&ctx(&session), &device.id).await.unwrap();
    assert_eq!(device.last_diagnostic_id.as_deref(), result["id"].as_str());
}

#[tokio::test]
#[serial]
async fn full_run_on_unknown_device_is_not_found() {
    let app = make_test_app().await;
    let session = sign_up(&app.db, "nodevice@shop.example").await;

    let response = app
        .router
        .oneshot(request(
            "POST",
            "/api/v1/diagnostic/full",
            Some(&session.access_token),
            Some(json!({ "device_id": "ghost" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let stored = DatabaseProvider::new(app.db.clone())
        .get_diagnostics(&ctx(&session))
        .await
        .unwrap();
    assert!(stored.is_empty());
}
