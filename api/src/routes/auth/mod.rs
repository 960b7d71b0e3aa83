//! `/api/v1/auth` routes.
//!
//! - `post.rs`: sign-up and login
//! - `get.rs`: the current account

pub mod get;
pub mod post;

use axum::{
    Router,
    routing::{get, post},
};
use util::state::AppState;

use get::get_me;
use post::{login, signup};

/// - `POST /auth/signup` → `signup`
/// - `POST /auth/login` → `login`
/// - `GET /auth/me` → `get_me`
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/me", get(get_me))
}
