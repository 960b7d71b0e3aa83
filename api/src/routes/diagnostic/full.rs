use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use services::collector::SystemCollector;
use services::providers::DatabaseProvider;
use services::types::FullDiagnosticRequest;
use services::{DataClient, DataProvider, DiagnosticOrchestrator};
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::{ApiError, ApiResponse};

/// POST /api/v1/diagnostic/full
///
/// Runs a complete diagnostic of the server host against one of the
/// caller's devices and answers when the run has finished.
///
/// ### Request Body
/// ```json
/// { "device_id": "…", "client_name": "Sipho", "client_phone": "082 555 0101" }
/// ```
///
/// ### Responses
/// - `201 Created` with the completed record
/// - `404 Not Found` for an unknown device (no record is created)
/// - `500 Internal Server Error` if collection failed; the record is kept as `failed`
pub async fn run_full(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<FullDiagnosticRequest>,
) -> impl IntoResponse {
    let providers: Vec<Arc<dyn DataProvider>> =
        vec![Arc::new(DatabaseProvider::new(state.db_clone()))];
    let orchestrator = DiagnosticOrchestrator::new(
        Arc::new(DataClient::new(providers)),
        Arc::new(SystemCollector),
    );

    match orchestrator
        .run(&user.context(), &req.device_id, req.client())
        .await
    {
        Ok(result) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(result, "Diagnostic completed")),
        )
            .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}
