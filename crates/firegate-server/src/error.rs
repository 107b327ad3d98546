//! Error types for the server.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use firegate_oauth::OAuthError;
use firegate_session::SessionError;
use serde::Serialize;
use thiserror::Error;

/// Body text for a request without usable credentials.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";

/// Body text for a session whose refresh failed.
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired, please log in again.";

/// Body text for a failed login callback.
pub const AUTH_FAILED_MESSAGE: &str = "Authentication failed";

/// Message of the generic upstream failure body.
pub const UPSTREAM_ERROR_MESSAGE: &str = "An error occurred";

/// Server error type.
#[derive(Debug, Error)]
pub enum ServerError {
    /// No session, or a session without an access token.
    #[error("Unauthorized")]
    Unauthenticated,

    /// The access token expired and could not be refreshed.
    #[error("Session expired: {0}")]
    SessionExpired(String),

    /// The login callback could not be turned into credentials.
    #[error("Authentication failed: {0}")]
    AuthExchangeFailed(String),

    /// The upstream API could not be reached or its body could not be read.
    #[error("Upstream unreachable: {0}")]
    UpstreamUnreachable(String),

    /// A POST/PUT body that is missing or not JSON. Answered like an
    /// upstream failure; nothing is sent upstream.
    #[error("Unreadable request body: {0}")]
    UnreadableBody(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<OAuthError> for ServerError {
    fn from(e: OAuthError) -> Self {
        match e {
            OAuthError::Unauthenticated => ServerError::Unauthenticated,
            OAuthError::SessionExpired(reason) => ServerError::SessionExpired(reason),
            OAuthError::Config(msg) => ServerError::Config(msg),
            other => ServerError::AuthExchangeFailed(other.to_string()),
        }
    }
}

impl From<SessionError> for ServerError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::InvalidSecret(msg) => ServerError::Config(msg),
            other => ServerError::Internal(format!("Session cookie: {}", other)),
        }
    }
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Body relayed when the upstream API fails below HTTP.
#[derive(Debug, Serialize)]
pub struct UpstreamErrorBody {
    pub message: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::Unauthenticated | ServerError::SessionExpired(_) => {
                StatusCode::UNAUTHORIZED
            }
            ServerError::AuthExchangeFailed(_)
            | ServerError::UpstreamUnreachable(_)
            | ServerError::UnreadableBody(_)
            | ServerError::Internal(_)
            | ServerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Server error");
        } else {
            tracing::warn!(status = %status, error = %self, "Client error");
        }

        match self {
            ServerError::Unauthenticated => (status, UNAUTHORIZED_MESSAGE).into_response(),
            ServerError::SessionExpired(_) => (status, SESSION_EXPIRED_MESSAGE).into_response(),
            ServerError::AuthExchangeFailed(_) => (status, AUTH_FAILED_MESSAGE).into_response(),
            ServerError::UpstreamUnreachable(_) | ServerError::UnreadableBody(_) => (
                status,
                Json(UpstreamErrorBody {
                    message: UPSTREAM_ERROR_MESSAGE.to_string(),
                }),
            )
                .into_response(),
            other => {
                let code = match &other {
                    ServerError::Config(_) => "config_error",
                    _ => "internal_error",
                };
                let body = ErrorResponse {
                    code: code.to_string(),
                    message: other.to_string(),
                };
                (status, Json(body)).into_response()
            }
        }
    }
}
