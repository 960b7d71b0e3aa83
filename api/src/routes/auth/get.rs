use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use services::session::AuthService;
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::{ApiError, ApiResponse};

/// GET /api/v1/auth/me
///
/// Account behind the bearer token. The password hash is never serialized.
pub async fn get_me(State(state): State<AppState>, user: AuthUser) -> impl IntoResponse {
    match AuthService::new(state.db_clone())
        .get_user(&user.context())
        .await
    {
        Ok(account) => (
            StatusCode::OK,
            Json(ApiResponse::success(account, "User retrieved")),
        )
            .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}
