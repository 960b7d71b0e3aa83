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
use crate::response::{ApiError, ApiResponse, Empty};

/// DELETE /api/v1/devices/{id}
///
/// Removes the device together with its diagnostic history.
///
/// ### Responses
/// - `200 OK` with `"data": null`
/// - `404 Not Found` if it does not exist or belongs to someone else
pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match provider(&state).delete_device(&user.context(), &id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::success(Empty, "Device deleted")),
        )
            .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}
