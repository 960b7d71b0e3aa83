use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use services::DataProvider;
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::{ApiError, ApiResponse};
use crate::routes::devices::provider;

/// GET /api/v1/diagnostics
pub async fn list(State(state): State<AppState>, user: AuthUser) -> impl IntoResponse {
    match provider(&state).get_diagnostics(&user.context()).await {
        Ok(list) => (
            StatusCode::OK,
            Json(ApiResponse::success(list, "Diagnostics retrieved")),
        )
            .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

/// GET /api/v1/diagnostics/{id}
pub async fn show(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match provider(&state).get_diagnostic(&user.context(), &id).await {
        Ok(diagnostic) => (
            StatusCode::OK,
            Json(ApiResponse::success(diagnostic, "Diagnostic retrieved")),
        )
            .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}
