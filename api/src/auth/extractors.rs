use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use axum_extra::extract::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use services::session::{self, Context, Session};

use crate::response::{ApiResponse, Empty};

/// Session of the caller, taken from a verified `Authorization: Bearer` JWT.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Session);

impl AuthUser {
    pub fn context(&self) -> Context {
        Context::with_session(self.0.clone())
    }

    pub fn user_id(&self) -> &str {
        self.0.user_id()
    }
}

/// Rejects with `401 Unauthorized` if the header is missing, malformed, or
/// the token is invalid or expired.
///
/// ```ignore
/// async fn protected_route(user: AuthUser) -> impl IntoResponse {
///     // user.0 is the caller's session
/// }
/// ```
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ApiResponse<Empty>>);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    (
                        StatusCode::UNAUTHORIZED,
                        Json(ApiResponse::error("Missing or invalid Authorization header")),
                    )
                })?;

        let session = session::verify_token(bearer.token()).map_err(|_| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::error("Invalid or expired token")),
            )
        })?;

        Ok(AuthUser(session))
    }
}
