use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use services::AppError;

/// Standardized API response wrapper for all outgoing JSON responses.
///
/// Every endpoint answers with the same shape:
/// ```json
/// {
///   "success": true,
///   "data": { ... },
///   "message": "Some message"
/// }
/// ```
///
/// Error responses carry `"data": null`.
#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,
    pub data: T,
    pub message: String,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: message.into(),
        }
    }

    /// Error response with default `data`.
    pub fn error(message: impl Into<String>) -> Self
    where
        T: Default,
    {
        Self {
            success: false,
            data: T::default(),
            message: message.into(),
        }
    }
}

/// Placeholder payload for responses without data. Serializes to `null`.
#[derive(Serialize, Default, Debug, Clone, Copy)]
pub struct Empty;

/// Service error rendered as an `ApiResponse` with a matching status code.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

/// Maps a service error to the HTTP status it is reported with.
pub fn status_for(err: &AppError) -> StatusCode {
    match err.root() {
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::NotAuthenticated | AppError::InvalidCredentials | AppError::Token(_) => {
            StatusCode::UNAUTHORIZED
        }
        AppError::Validation(_) | AppError::InvalidTransition { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        AppError::Conflict(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        (
            status,
            Json(ApiResponse::<Empty>::error(self.0.to_string())),
        )
            .into_response()
    }
}
