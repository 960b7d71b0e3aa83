use axum::{Json, Router, response::IntoResponse, routing::get};
use util::state::AppState;

use crate::response::ApiResponse;

/// Builds the `/health` route group.
///
/// Mounted at the server root rather than under `/api/v1`, because data
/// clients probe `{API_URL}/health` before trusting the primary API.
///
/// # Returns
/// An Axum `Router` with the `GET /health` route configured.
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// GET /health
///
/// Liveness probe used by clients to decide whether the primary API is up.
///
/// ### Response
/// - `200 OK`
///
/// ```json
/// {
///   "success": true,
///   "data": "OK",
///   "message": "Health check passed"
/// }
/// ```
pub async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::success("OK", "Health check passed"))
}
