//! OAuth 2.0 authorization-code login and token lifecycle for firegate.
//!
//! The proxy is a confidential OAuth client of the Firefly III authorization
//! server. Tokens never reach the browser; they live in the sealed session
//! cookie and are refreshed here when they expire.
//!
//! # Components
//!
//! - [`oauth`] - client config, authorization URL, token endpoint (code exchange / refresh)
//! - [`token_manager`] - login completion and the per-request expiry/refresh decision
//! - [`single_flight`] - optional coalescing of concurrent refreshes

pub mod error;
pub mod oauth;
pub mod single_flight;
pub mod token_manager;

pub use error::{OAuthError, Result};
pub use oauth::{
    HttpTokenEndpoint, OAuthConfig, SharedTokenEndpoint, TokenEndpoint, TokenResponse,
    build_authorization_url, build_http_client,
};
pub use single_flight::RefreshSingleFlight;
pub use token_manager::SessionTokenManager;
