use axum::http::StatusCode;
use serde_json::json;
use serial_test::serial;
use tower::ServiceExt;

use crate::helpers::app::{get_json_body, make_test_app, request, sign_up};

#[tokio::test]
#[serial]
async fn signup_returns_a_usable_session() {
    let app = make_test_app().await;

    let payload = json!({ "email": "Tech@Shop.example", "password": "password123", "full_name": "Lerato" });
    let response = app
        .router
        .clone()
        .oneshot(request("POST", "/api/v1/auth/signup", None, Some(payload)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = get_json_body(response).await;
    assert_eq!(json["success"], true);
    let token = json["data"]["access_token"].as_str().unwrap().to_owned();
    assert!(json["data"]["expires_at"].as_str().is_some());

    let response = app
        .router
        .oneshot(request("GET", "/api/v1/auth/me", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_json_body(response).await;
    assert_eq!(json["data"]["email"], "tech@shop.example");
    assert_eq!(json["data"]["full_name"], "Lerato");
    assert!(json["data"].get("password_hash").is_none());
}

#[tokio::test]
#[serial]
async fn signup_rejects_duplicates_and_short_passwords() {
    let app = make_test_app().await;
    sign_up(&app.db, "taken@shop.example").await;

    let response = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/auth/signup",
            None,
            Some(json!({ "email": "taken@shop.example", "password": "password123" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .router
        .oneshot(request(
            "POST",
            "/api/v1/auth/signup",
            None,
            Some(json!({ "email": "new@shop.example", "password": "short" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = get_json_body(response).await;
    assert_eq!(json["success"], false);
}

#[tokio::test]
#[serial]
async fn login_checks_the_password() {
    let app = make_test_app().await;
    sign_up(&app.db, "login@shop.example").await;

    let ok = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "login@shop.example", "password": "password123" })),
        ))
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);

    let wrong = app
        .router
        .oneshot(request(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "login@shop.example", "password": "password124" })),
        ))
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    let json = get_json_body(wrong).await;
    assert_eq!(json["message"], "invalid email or password");
}

#[tokio::test]
#[serial]
async fn me_requires_a_valid_token() {
    let app = make_test_app().await;

    let missing = app
        .router
        .clone()
        .oneshot(request("GET", "/api/v1/auth/me", None, None))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let forged = app
        .router
        .oneshot(request("GET", "/api/v1/auth/me", Some("not.a.jwt"), None))
        .await
        .unwrap();
    assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);
    let json = get_json_body(forged).await;
    assert_eq!(json["message"], "Invalid or expired token");
}
