use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use services::DataProvider;
use util::state::AppState;

use super::provider;
use crate::auth::AuthUser;
use crate::response::{ApiError, ApiResponse};

/// GET /api/v1/devices
///
/// Devices owned by the caller, newest first.
///
/// ### Responses
/// - `200 OK` with the (possibly empty) list
/// - `401 Unauthorized` without a valid bearer token
pub async fn list(State(state): State<AppState>, user: AuthUser) -> impl IntoResponse {
    match provider(&state).get_devices(&user.context()).await {
        Ok(devices) => (
            StatusCode::OK,
            Json(ApiResponse::success(devices, "Devices retrieved")),
        )
            .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

/// GET /api/v1/devices/{id}
///
/// - `200 OK` with the device
/// - `404 Not Found` if it does not exist or belongs to someone else
pub async fn show(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match provider(&state).get_device(&user.context(), &id).await {
        Ok(device) => (
            StatusCode::OK,
            Json(ApiResponse::success(device, "Device retrieved")),
        )
            .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}
