use axum::{
    body::Body,
    extract::{ConnectInfo, FromRequestParts},
    http::{Method, Request},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::TypedHeader;
use headers::UserAgent;
use std::net::SocketAddr;
use tracing::info;

use crate::auth::AuthUser;

/// Logs method, path, client address, user id (if the bearer token verifies)
/// and user agent for each request. CORS preflight `OPTIONS` requests pass
/// through unlogged.
///
/// ### Usage:
/// Apply this middleware globally. The server must be started with
/// `into_make_service_with_connect_info::<SocketAddr>()` so the client
/// address is available:
///
/// ```ignore
/// use axum::Router;
/// use axum::middleware::from_fn;
/// use api::auth::middleware::log_request;
///
/// let app = Router::new().layer(from_fn(log_request));
/// ```
///
/// ### Fields Logged:
/// - `method`: HTTP method used (`GET`, `POST`, etc.)
/// - `path`: Requested URI path
/// - `ip`: Remote IP address of the client
/// - `user`: User id if the token verifies, `anonymous` otherwise
/// - `user_agent`: Value of the `User-Agent` header, `unknown` if absent
pub async fn log_request(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let (mut parts, body) = req.into_parts();

    // Skip logging for preflight requests
    if parts.method == Method::OPTIONS {
        return next.run(Request::from_parts(parts, body)).await;
    }

    let user = AuthUser::from_request_parts(&mut parts, &())
        .await
        .ok()
        .map(|AuthUser(session)| session.user.id);

    let user_agent = TypedHeader::<UserAgent>::from_request_parts(&mut parts, &())
        .await
        .ok()
        .map(|TypedHeader(ua)| ua.to_string());

    info!(
        method = ?parts.method,
        path = %parts.uri.path(),
        ip = %addr.ip(),
        user = user.as_deref().unwrap_or("anonymous"),
        user_agent = user_agent.as_deref().unwrap_or("unknown"),
        "Incoming request"
    );

    next.run(Request::from_parts(parts, body)).await
}
