//! `/api/v1/diagnostics` routes: the raw diagnostic records.

pub mod get;
pub mod post;
pub mod put;

use axum::{Router, routing::get};
use util::state::AppState;

pub fn diagnostics_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get::list).post(post::create))
        .route("/{id}", get(get::show).put(put::update))
}
