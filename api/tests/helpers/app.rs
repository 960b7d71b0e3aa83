use std::net::SocketAddr;

use api::routes::app;
use axum::{
    Router,
    body::Body,
    http::{Request, header::{AUTHORIZATION, CONTENT_TYPE}},
    response::Response,
};
use db::test_utils::setup_test_db;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use services::session::{AuthService, Context, Session, SignUp};
use util::{state::AppState, test_helpers::setup_test_config};

pub struct TestApp {
    pub db: DatabaseConnection,
    pub router: Router,
}

/// Fresh in-memory database behind the full router.
pub async fn make_test_app() -> TestApp {
    setup_test_config();
    let db = setup_test_db().await;
    let router = app(AppState::new(db.clone()));
    TestApp { db, router }
}

pub async fn sign_up(db: &DatabaseConnection, email: &str) -> Session {
    AuthService::new(db.clone())
        .sign_up(SignUp {
            email: email.into(),
            password: "password123".into(),
            full_name: None,
        })
        .await
        .expect("sign up")
}

pub fn ctx(session: &Session) -> Context {
    Context::with_session(session.clone())
}

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn get_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Serves the router on an ephemeral local port and returns its base URL.
pub async fn spawn_server(db: DatabaseConnection) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    let router = app(AppState::new(db));
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}
