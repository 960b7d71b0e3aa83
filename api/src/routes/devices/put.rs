use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use services::DataProvider;
use services::types::DeviceUpdate;
use util::state::AppState;

use super::provider;
use crate::auth::AuthUser;
use crate::response::{ApiError, ApiResponse};

/// PUT /api/v1/devices/{id}
///
/// Partial update; omitted fields are left as they are. Setting
/// `last_diagnostic_id` requires a diagnostic of this same device.
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(patch): Json<DeviceUpdate>,
) -> impl IntoResponse {
    match provider(&state)
        .update_device(&user.context(), &id, &patch)
        .await
    {
        Ok(device) => (
            StatusCode::OK,
            Json(ApiResponse::success(device, "Device updated")),
        )
            .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}
