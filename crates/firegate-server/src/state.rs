//! Application state shared across handlers.

use std::sync::Arc;

use firegate_config::ResolvedConfig;
use firegate_oauth::{
    HttpTokenEndpoint, OAuthConfig, SessionTokenManager, SharedTokenEndpoint, build_http_client,
};
use firegate_session::{SessionCodec, SessionCookieConfig};
use tracing::info;

use crate::config::ServerConfig;
use crate::error::Result;
use crate::gateway::Gateway;

/// Application state shared across all handlers.
///
/// Everything here is immutable after startup; per-browser state lives in
/// the session cookie.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,

    /// OAuth client settings, for the login redirect.
    pub oauth: Arc<OAuthConfig>,

    /// Session cookie codec.
    pub sessions: Arc<SessionCodec>,

    /// Login completion and token refresh.
    pub tokens: Arc<SessionTokenManager>,

    /// Upstream API client.
    pub gateway: Arc<Gateway>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        config: ServerConfig,
        oauth: OAuthConfig,
        sessions: SessionCodec,
        tokens: SessionTokenManager,
        gateway: Gateway,
    ) -> Self {
        Self {
            config: Arc::new(config),
            oauth: Arc::new(oauth),
            sessions: Arc::new(sessions),
            tokens: Arc::new(tokens),
            gateway: Arc::new(gateway),
        }
    }

    /// Wire up the production state from a resolved config.
    pub fn from_resolved(resolved: &ResolvedConfig) -> Result<Self> {
        let client = build_http_client(resolved.accept_invalid_certs)?;

        let oauth = OAuthConfig::new(
            &resolved.auth_base_url,
            &resolved.client_id,
            &resolved.client_secret,
        );
        let endpoint: SharedTokenEndpoint =
            Arc::new(HttpTokenEndpoint::new(oauth.clone(), client.clone()));
        let tokens =
            SessionTokenManager::new(endpoint).with_single_flight(resolved.single_flight_refresh);

        let sessions = SessionCodec::new(
            &resolved.session_secret,
            SessionCookieConfig {
                cookie_name: resolved.cookie_name.clone(),
                secure: resolved.secure_cookies,
                ttl_secs: resolved.session_ttl_secs,
            },
        )?;

        let gateway = Gateway::new(client, &resolved.upstream_base_url, &resolved.api_prefix);

        info!(
            upstream = %gateway.api_root(),
            auth = %oauth.auth_base_url,
            single_flight_refresh = tokens.single_flight_enabled(),
            secure_cookies = resolved.secure_cookies,
            "Application state initialized"
        );

        Ok(Self::new(
            ServerConfig::from_resolved(resolved),
            oauth,
            sessions,
            tokens,
            gateway,
        ))
    }
}
