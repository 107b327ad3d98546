//! HTTP routes.

pub mod auth;
pub mod health;
pub mod proxy;

pub use auth::{
    CALLBACK_PATH, CallbackParams, auth_routes, callback_handler, login_handler, logout_handler,
    redirect_uri,
};
pub use health::{HealthResponse, health_routes};
pub use proxy::{PROXY_PREFIX, proxy_handler, proxy_routes};

use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

/// `302 Found` to `location`.
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Append the session's `Set-Cookie`, if the session changed.
pub(crate) fn with_session_cookie(mut response: Response, cookie: Option<HeaderValue>) -> Response {
    if let Some(cookie) = cookie {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    response
}
