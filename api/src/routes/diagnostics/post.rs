use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use services::DataProvider;
use services::types::DiagnosticResult;
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::{ApiError, ApiResponse};
use crate::routes::devices::provider;

/// POST /api/v1/diagnostics
///
/// Stores a new record. Only `pending` records are accepted, and the device
/// must belong to the caller. The stored `user_id` is always the caller's.
///
/// ### Responses
/// - `201 Created` with the stored record
/// - `404 Not Found` for an unknown device
/// - `422 Unprocessable Entity` for a non-pending or inconsistent record
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(diagnostic): Json<DiagnosticResult>,
) -> impl IntoResponse {
    match provider(&state)
        .save_diagnostic(&user.context(), &diagnostic)
        .await
    {
        Ok(saved) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(saved, "Diagnostic saved")),
        )
            .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}
