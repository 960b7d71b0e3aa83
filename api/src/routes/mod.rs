//! HTTP route entry point.
//!
//! - `/health` → liveness probe (public)
//! - `/api/v1/auth` → sign-up, login and the current account
//! - `/api/v1/devices` → device CRUD (authenticated)
//! - `/api/v1/diagnostics` → diagnostic records (authenticated)
//! - `/api/v1/diagnostic` → history and full server-side runs (authenticated)
//!
//! Authentication is enforced per handler through the [`AuthUser`](crate::auth::AuthUser)
//! extractor.

use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use tower_http::cors::{Any, CorsLayer};
use util::state::AppState;

pub mod auth;
pub mod devices;
pub mod diagnostic;
pub mod diagnostics;
pub mod health;

use auth::auth_routes;
use devices::devices_routes;
use diagnostic::diagnostic_routes;
use diagnostics::diagnostics_routes;
use health::health_routes;

/// Routes nested under `/api/v1`.
pub fn v1_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/devices", devices_routes())
        .nest("/diagnostics", diagnostics_routes())
        .nest("/diagnostic", diagnostic_routes())
}

/// Builds the complete application with state and CORS applied.
///
/// Request logging needs connection info, so it is layered on in `main`
/// rather than here.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    Router::new()
        .merge(health_routes())
        .nest("/api/v1", v1_routes())
        .layer(cors)
        .with_state(state)
}
