use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use services::DataProvider;
use services::types::HistoryFilter;
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::{ApiError, ApiResponse};
use crate::routes::devices::provider;

/// GET /api/v1/diagnostic/history/?page&limit&device_id&status&start_date&end_date
///
/// One page of the caller's diagnostics, newest first. `page` defaults to 1
/// and `limit` to 10 (capped at 100). Dates are RFC 3339 and inclusive.
/// A page past the end answers with an empty `data` list.
///
/// ### Responses
/// - `200 OK` with the page
/// - `401 Unauthorized` without a valid bearer token
///
/// ```json
/// {
///   "success": true,
///   "data": { "data": [ ... ], "total": 12, "page": 2, "limit": 5, "pages": 3 },
///   "message": "History retrieved"
/// }
/// ```
pub async fn history(
    State(state): State<AppState>,
    user: AuthUser,
    Query(filter): Query<HistoryFilter>,
) -> impl IntoResponse {
    match provider(&state)
        .get_diagnostic_history(&user.context(), &filter.normalized())
        .await
    {
        Ok(page) => (
            StatusCode::OK,
            Json(ApiResponse::success(page, "History retrieved")),
        )
            .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}
