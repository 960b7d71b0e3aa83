use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use services::DataProvider;
use services::types::NewDevice;
use util::state::AppState;

use super::provider;
use crate::auth::AuthUser;
use crate::response::{ApiError, ApiResponse};

/// POST /api/v1/devices
///
/// ### Request Body
/// ```json
/// {
///   "name": "Front Desk PC",
///   "device_type": "desktop",
///   "os_name": "Windows",
///   "os_version": "11"
/// }
/// ```
///
/// ### Responses
/// - `201 Created` with the stored device
/// - `422 Unprocessable Entity` if the name is empty or a field is too long
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<NewDevice>,
) -> impl IntoResponse {
    match provider(&state).create_device(&user.context(), &req).await {
        Ok(device) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(device, "Device created")),
        )
            .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}
