//! Login, callback and logout.
//!
//! `/auth/login` sends the browser to the authorization server,
//! `/auth/callback` turns the returned code into a credential record stored
//! in the session cookie, and `/auth/logout` drops that cookie.

use axum::{
    Router,
    extract::{Query, State, rejection::QueryRejection},
    http::{HeaderMap, header},
    response::Response,
    routing::get,
};
use firegate_oauth::build_authorization_url;
use firegate_session::Session;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::routes::{found, with_session_cookie};
use crate::state::AppState;

/// Path the authorization server redirects back to.
pub const CALLBACK_PATH: &str = "/auth/callback";

const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Query parameters of the authorization server's redirect.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// The redirect URI registered for this deployment.
///
/// Uses the configured public URL when there is one, otherwise the scheme
/// from `X-Forwarded-Proto` (default `http`) and the `Host` header. Login and
/// callback must produce the same string for the code exchange to succeed.
pub fn redirect_uri(config: &ServerConfig, headers: &HeaderMap) -> String {
    if let Some(public_url) = &config.public_url {
        return format!("{}{}", public_url, CALLBACK_PATH);
    }

    let proto = headers
        .get(FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");

    format!("{}://{}{}", proto, host, CALLBACK_PATH)
}

/// `GET /auth/login`
pub async fn login_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let redirect_uri = redirect_uri(&state.config, &headers);
    info!(redirect_uri = %redirect_uri, "Redirecting to authorization server");
    found(&build_authorization_url(&state.oauth, &redirect_uri))
}

/// `GET /auth/callback?code=...`
pub async fn callback_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    params: std::result::Result<Query<CallbackParams>, QueryRejection>,
) -> Result<Response> {
    let Query(params) = params
        .map_err(|e| ServerError::AuthExchangeFailed(format!("malformed callback query: {}", e)))?;

    if let Some(error) = params.error {
        return Err(ServerError::AuthExchangeFailed(format!(
            "authorization server returned '{}': {}",
            error,
            params.error_description.unwrap_or_default()
        )));
    }
    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ServerError::AuthExchangeFailed("missing authorization code".into()))?;

    let redirect_uri = redirect_uri(&state.config, &headers);
    let mut session = state.sessions.load(&headers);

    state
        .tokens
        .complete_login(&mut session, &code, &redirect_uri)
        .await
        .map_err(|e| {
            warn!(error = %e, "Authorization code exchange failed");
            ServerError::AuthExchangeFailed(e.to_string())
        })?;

    let cookie = state.sessions.set_cookie(&session)?;
    info!("Login completed");
    Ok(with_session_cookie(found("/"), cookie))
}

/// `GET|POST /auth/logout`
pub async fn logout_handler(State(state): State<AppState>) -> Result<Response> {
    let mut session = Session::new();
    session.destroy();
    let cookie = state.sessions.set_cookie(&session)?;
    info!("Session cleared");
    Ok(with_session_cookie(found("/"), cookie))
}

/// Create login/callback/logout routes.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", get(login_handler))
        .route(CALLBACK_PATH, get(callback_handler))
        .route("/auth/logout", get(logout_handler).post(logout_handler))
}
