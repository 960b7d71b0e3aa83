use axum::http::StatusCode;
use serial_test::serial;
use services::DataProvider;
use services::providers::DatabaseProvider;
use services::types::{ClientInfo, Device, DeviceType, DiagnosticResult, DiagnosticStatus, NewDevice};
use tower::ServiceExt;

use crate::helpers::app::{ctx, get_json_body, make_test_app, request, sign_up};

async fn bench_device(db: &sea_orm::DatabaseConnection, session: &services::Session) -> Device {
    DatabaseProvider::new(db.clone())
        .create_device(&ctx(session), &NewDevice::named("Bench PC", DeviceType::Desktop))
        .await
        .unwrap()
}

#[tokio::test]
#[serial]
async fn records_move_forward_through_the_lifecycle() {
    let app = make_test_app().await;
    let session = sign_up(&app.db, "life@shop.example").await;
    let token = Some(session.access_token.as_str());
    let device = bench_device(&app.db, &session).await;

    let mut record = DiagnosticResult::pending(&device.id, "spoofed-user", &ClientInfo::default());
    let saved = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/diagnostics",
            token,
            Some(serde_json::to_value(&record).unwrap()),
        ))
        .await
        .unwrap();
    assert_eq!(saved.status(), StatusCode::CREATED);
    let json = get_json_body(saved).await;
    assert_eq!(json["data"]["status"], "pending");
    assert_eq!(json["data"]["user_id"], session.user.id.as_str());
    record.user_id = session.user.id.clone();

    record.status = DiagnosticStatus::Running;
    let running = app
        .router
        .clone()
        .oneshot(request(
            "PUT",
            &format!("/api/v1/diagnostics/{}", record.id),
            token,
            Some(serde_json::to_value(&record).unwrap()),
        ))
        .await
        .unwrap();
    assert_eq!(running.status(), StatusCode::OK);

    record.status = DiagnosticStatus::Completed;
    record.health_score = Some(90);
    let completed = app
        .router
        .clone()
        .oneshot(request(
            "PUT",
            &format!("/api/v1/diagnostics/{}", record.id),
            token,
            Some(serde_json::to_value(&record).unwrap()),
        ))
        .await
        .unwrap();
    assert_eq!(completed.status(), StatusCode::OK);

    record.status = DiagnosticStatus::Running;
    record.health_score = None;
    let backwards = app
        .router
        .clone()
        .oneshot(request(
            "PUT",
            &format!("/api/v1/diagnostics/{}", record.id),
            token,
            Some(serde_json::to_value(&record).unwrap()),
        ))
        .await
        .unwrap();
    assert_eq!(backwards.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let fetched = app
        .router
        .oneshot(request("GET", &format!("/api/v1/diagnostics/{}", record.id), token, None))
        .await
        .unwrap();
    let json = get_json_body(fetched).await;
    assert_eq!(json["data"]["status"], "completed");
    assert_eq!(json["data"]["health_score"], 90);
}

#[tokio::test]
#[serial]
async fn only_pending_records_can_be_created() {
    let app = make_test_app().await;
    let session = sign_up(&app.db, "pending@shop.example").await;
    let device = bench_device(&app.db, &session).await;

    let mut record = DiagnosticResult::pending(&device.id, &session.user.id, &ClientInfo::default());
    record.status = DiagnosticStatus::Completed;
    record.health_score = Some(100);

    let response = app
        .router
        .oneshot(request(
            "POST",
            "/api/v1/diagnostics",
            Some(&session.access_token),
            Some(serde_json::to_value(&record).unwrap()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
#[serial]
async fn path_and_body_ids_must_agree() {
    let app = make_test_app().await;
    let session = sign_up(&app.db, "ids@shop.example").await;
    let device = bench_device(&app.db, &session).await;
    let record = DiagnosticResult::pending(&device.id, &session.user.id, &ClientInfo::default());

    let response = app
        .router
        .oneshot(request(
            "PUT",
            "/api/v1/diagnostics/some-other-id",
            Some(&session.access_token),
            Some(serde_json::to_value(&record).unwrap()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
#[serial]
async fn unknown_diagnostics_are_not_found() {
    let app = make_test_app().await;
    let session = sign_up(&app.db, "missing@shop.example").await;

    let response = app
        .router
        .oneshot(request(
            "GET",
            "/api/v1/diagnostics/does-not-exist",
            Some(&session.access_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
