//! Authenticated API tunnel: `/proxy/{*path}` → upstream `{api_prefix}/{path}`.

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::de::IgnoredAny;

use crate::error::{Result, ServerError};
use crate::gateway::ForwardRequest;
use crate::routes::with_session_cookie;
use crate::state::AppState;

/// Prefix stripped from the request path before forwarding.
pub const PROXY_PREFIX: &str = "/proxy/";

const ALLOWED_METHODS: &str = "GET,POST,PUT,DELETE";

/// `GET|POST|PUT|DELETE /proxy/{*path}`
///
/// The session's `Set-Cookie` is computed once the credentials are settled,
/// so a refreshed record is persisted even if the upstream call then fails,
/// and a failed refresh clears the cookie along with the 401.
pub async fn proxy_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut session = state.sessions.load(&headers);
    let credentials = state.tokens.valid_credentials(&mut session).await;

    let cookie = match state.sessions.set_cookie(&session) {
        Ok(cookie) => cookie,
        Err(e) => return ServerError::from(e).into_response(),
    };

    let response = match credentials {
        Ok(credentials) => forward(&state, method, &uri, body, &credentials.access_token)
            .await
            .into_response(),
        Err(e) => ServerError::from(e).into_response(),
    };

    with_session_cookie(response, cookie)
}

async fn forward(
    state: &AppState,
    method: Method,
    uri: &Uri,
    body: Bytes,
    access_token: &str,
) -> Result<Response> {
    let path = uri.path().strip_prefix(PROXY_PREFIX).unwrap_or_default();
    let mut request = ForwardRequest::new(method.clone(), path).with_query(uri.query());

    if method == Method::POST || method == Method::PUT {
        serde_json::from_slice::<IgnoredAny>(&body)
            .map_err(|e| ServerError::UnreadableBody(e.to_string()))?;
        request = request.with_body(body);
    }

    Ok(state.gateway.forward(request, access_token).await?.into_response())
}

/// axum answers HEAD with the GET handler unless HEAD has its own route.
async fn head_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, ALLOWED_METHODS)],
    )
        .into_response()
}

/// Create the proxy routes. Methods other than GET/POST/PUT/DELETE get 405.
pub fn proxy_routes() -> Router<AppState> {
    Router::new().route(
        "/proxy/{*path}",
        get(proxy_handler)
            .head(head_not_allowed)
            .post(proxy_handler)
            .put(proxy_handler)
            .delete(proxy_handler),
    )
}
