use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use services::session::{AuthService, Credentials, SignUp};
use util::state::AppState;

use crate::response::{ApiError, ApiResponse};

/// POST /api/v1/auth/signup
///
/// Creates an account and returns a session for it.
///
/// ### Request Body
/// ```json
/// { "email": "tech@shop.example", "password": "at-least-8", "full_name": "Lerato" }
/// ```
///
/// ### Responses
/// - `201 Created` with `{ access_token, user: { id, email }, expires_at }`
/// - `409 Conflict` if the email is taken
/// - `422 Unprocessable Entity` on a bad email or short password
pub async fn signup(State(state): State<AppState>, Json(req): Json<SignUp>) -> impl IntoResponse {
    match AuthService::new(state.db_clone()).sign_up(req).await {
        Ok(session) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(session, "Account created")),
        )
            .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

/// POST /api/v1/auth/login
///
/// ### Request Body
/// ```json
/// { "email": "tech@shop.example", "password": "at-least-8" }
/// ```
///
/// ### Responses
/// - `200 OK` with the session
/// - `401 Unauthorized` on unknown email or wrong password
pub async fn login(State(state): State<AppState>, Json(creds): Json<Credentials>) -> impl IntoResponse {
    match AuthService::new(state.db_clone())
        .sign_in_with_password(creds)
        .await
    {
        Ok(session) => (
            StatusCode::OK,
            Json(ApiResponse::success(session, "Login successful")),
        )
            .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}
