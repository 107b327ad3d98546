//! Error types for OAuth exchanges and the token lifecycle.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, OAuthError>;

/// Errors that can occur while obtaining or refreshing tokens.
///
/// `Clone` so a single refresh outcome can be shared between waiters.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OAuthError {
    /// Network/HTTP error before a response was received.
    #[error("Network error: {0}")]
    Network(String),

    /// The token endpoint answered with a non-success status.
    #[error("Token endpoint rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// The token endpoint answered with something other than a token response.
    #[error("Backend error: {0}")]
    Backend(String),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// The session holds no usable credentials.
    #[error("No authenticated session")]
    Unauthenticated,

    /// The credentials expired and could not be refreshed; the session was destroyed.
    #[error("Session expired: {0}")]
    SessionExpired(String),
}
