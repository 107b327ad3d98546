//! Error types for session sealing and cookie handling.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors that can occur while sealing or unsealing a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The configured session secret cannot be used as a key.
    #[error("Invalid session secret: {0}")]
    InvalidSecret(String),

    /// The cookie value is not a sealed session.
    #[error("Malformed session cookie: {0}")]
    Malformed(String),

    /// The ciphertext failed authentication (wrong key or tampered value).
    #[error("Session cookie failed authentication")]
    Tampered,

    /// The sealed payload is older than the session TTL.
    #[error("Session cookie expired")]
    Expired,

    /// Encrypting the payload failed.
    #[error("Failed to seal session")]
    Seal,

    /// The payload could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The generated `Set-Cookie` value is not a valid header.
    #[error("Invalid cookie header: {0}")]
    Header(String),
}
