//! `/api/v1/diagnostic` routes: paged history and server-side runs.

pub mod full;
pub mod history;

use axum::{
    Router,
    routing::{get, post},
};
use util::state::AppState;

/// - `GET /diagnostic/history` and `GET /diagnostic/history/` → `history::history`
/// - `POST /diagnostic/full` → `full::run_full`
pub fn diagnostic_routes() -> Router<AppState> {
    Router::new()
        .route("/history", get(history::history))
        .route("/history/", get(history::history))
        .route("/full", post(full::run_full))
}
