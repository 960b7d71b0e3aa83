//! `/api/v1/devices` routes. Every handler acts for the caller's account
//! only; other users' devices read as not found.

pub mod delete;
pub mod get;
pub mod post;
pub mod put;

use axum::{Router, routing::get};
use services::providers::DatabaseProvider;
use util::state::AppState;

/// - `GET /devices` → `get::list`
/// - `POST /devices` → `post::create`
/// - `GET /devices/{id}` → `get::show`
/// - `PUT /devices/{id}` → `put::update`
/// - `DELETE /devices/{id}` → `delete::remove`
pub fn devices_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get::list).post(post::create))
        .route(
            "/{id}",
            get(get::show).put(put::update).delete(delete::remove),
        )
}

pub(crate) fn provider(state: &AppState) -> DatabaseProvider {
    DatabaseProvider::new(state.db_clone())
}
