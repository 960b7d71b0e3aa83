use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use services::types::DiagnosticResult;
use services::{AppError, DataProvider};
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::{ApiError, ApiResponse};
use crate::routes::devices::provider;

/// PUT /api/v1/diagnostics/{id}
///
/// Replaces a record in place. The status may only move forward
/// (`pending → running → completed | failed`, or straight to `failed`);
/// anything else is rejected with `422`.
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(diagnostic): Json<DiagnosticResult>,
) -> impl IntoResponse {
    if diagnostic.id != id {
        return ApiError(AppError::Validation(format!(
            "body id {} does not match path id {id}",
            diagnostic.id
        )))
        .into_response();
    }

    match provider(&state)
        .update_diagnostic(&user.context(), &diagnostic)
        .await
    {
        Ok(updated) => (
            StatusCode::OK,
            Json(ApiResponse::success(updated, "Diagnostic updated")),
        )
            .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}
