use axum::http::StatusCode;
use serde_json::json;
use serial_test::serial;
use tower::ServiceExt;

use crate::helpers::app::{get_json_body, make_test_app, request, sign_up};

#[tokio::test]
#[serial]
async fn device_crud_round_trip() {
    let app = make_test_app().await;
    let session = sign_up(&app.db, "crud@shop.example").await;
    let token = Some(session.access_token.as_str());

    let created = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/devices",
            token,
            Some(json!({ "name": "Front Desk PC", "device_type": "desktop", "os_name": "Windows" })),
        ))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let json = get_json_body(created).await;
    let id = json["data"]["id"].as_str().unwrap().to_owned();
    assert_eq!(json["data"]["user_id"], session.user.id.as_str());
    assert_eq!(json["data"]["device_type"], "desktop");

    let updated = app
        .router
        .clone()
        .oneshot(request(
            "PUT",
            &format!("/api/v1/devices/{id}"),
            token,
            Some(json!({ "os_version": "11" })),
        ))
        .await
        .unwrap();
    assert_eq!(updated.status(), StatusCode::OK);
    let json = get_json_body(updated).await;
    assert_eq!(json["data"]["name"], "Front Desk PC");
    assert_eq!(json["data"]["os_version"], "11");

    let listed = app
        .router
        .clone()
        .oneshot(request("GET", "/api/v1/devices", token, None))
        .await
        .unwrap();
    let json = get_json_body(listed).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    let deleted = app
        .router
        .clone()
        .oneshot(request("DELETE", &format!("/api/v1/devices/{id}"), token, None))
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::OK);

    let gone = app
        .router
        .oneshot(request("GET", &format!("/api/v1/devices/{id}"), token, None))
        .await
        .unwrap();
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[serial]
async fn devices_are_private_to_their_owner() {
    let app = make_test_app().await;
    let owner = sign_up(&app.db, "owner@shop.example").await;
    let other = sign_up(&app.db, "other@shop.example").await;

    let created = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/devices",
            Some(&owner.access_token),
            Some(json!({ "name": "Laptop", "device_type": "laptop" })),
        ))
        .await
        .unwrap();
    let id = get_json_body(created).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_owned();

    let peek = app
        .router
        .clone()
        .oneshot(request("GET", &format!("/api/v1/devices/{id}"), Some(&other.access_token), None))
        .await
        .unwrap();
    assert_eq!(peek.status(), StatusCode::NOT_FOUND);

    let anonymous = app
        .router
        .oneshot(request("GET", "/api/v1/devices", None, None))
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[serial]
async fn blank_device_names_are_rejected() {
    let app = make_test_app().await;
    let session = sign_up(&app.db, "blank@shop.example").await;

    let response = app
        .router
        .oneshot(request(
            "POST",
            "/api/v1/devices",
            Some(&session.access_token),
            Some(json!({ "name": "", "device_type": "desktop" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
