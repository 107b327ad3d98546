//! Configuration types mapping to the TOML schema.
//!
//! ```toml
//! [server]      # bind address, public URL, body limit
//! [upstream]    # Firefly III base URL, API prefix, TLS trust
//! [oauth]       # client credentials, refresh policy
//! [session]     # cookie secret and attributes
//! ```
//!
//! Every field is optional so that partial layers can be merged; see
//! [`ResolvedConfig`](crate::ResolvedConfig) for the validated form.

use serde::{Deserialize, Serialize};

/// Placeholder shown instead of secret values.
pub const REDACTED: &str = "***";

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure (one layer).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FiregateConfig {
    pub server: ServerSection,
    pub upstream: UpstreamSection,
    pub oauth: OAuthSection,
    pub session: SessionSection,
}

impl FiregateConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> crate::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> crate::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: FiregateConfig) {
        self.server.merge(other.server);
        self.upstream.merge(other.upstream);
        self.oauth.merge(other.oauth);
        self.session.merge(other.session);
    }

    /// Copy with every secret replaced by [`REDACTED`].
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.oauth.client_secret.is_some() {
            copy.oauth.client_secret = Some(REDACTED.to_string());
        }
        if copy.session.secret.is_some() {
            copy.session.secret = Some(REDACTED.to_string());
        }
        copy
    }
}

fn overlay<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sections
// ─────────────────────────────────────────────────────────────────────────────

/// `[server]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Listen address, e.g. `127.0.0.1:3000`.
    pub bind: Option<String>,
    /// Externally visible origin used to build the OAuth redirect URI.
    /// When unset it is derived from `Host` / `X-Forwarded-Proto`.
    pub public_url: Option<String>,
    /// Maximum accepted request body, in bytes.
    pub max_body_size: Option<usize>,
    pub request_logging: Option<bool>,
    /// Deployment environment; `production` turns on secure cookies.
    pub environment: Option<String>,
}

impl ServerSection {
    fn merge(&mut self, other: Self) {
        overlay(&mut self.bind, other.bind);
        overlay(&mut self.public_url, other.public_url);
        overlay(&mut self.max_body_size, other.max_body_size);
        overlay(&mut self.request_logging, other.request_logging);
        overlay(&mut self.environment, other.environment);
    }
}

/// `[upstream]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamSection {
    /// Firefly III base URL.
    pub base_url: Option<String>,
    /// Versioned API prefix appended to the base URL.
    pub api_prefix: Option<String>,
    /// Authorization server base URL; defaults to `base_url`.
    pub auth_base_url: Option<String>,
    /// Disable TLS certificate validation for upstream connections.
    pub accept_invalid_certs: Option<bool>,
}

impl UpstreamSection {
    fn merge(&mut self, other: Self) {
        overlay(&mut self.base_url, other.base_url);
        overlay(&mut self.api_prefix, other.api_prefix);
        overlay(&mut self.auth_base_url, other.auth_base_url);
        overlay(&mut self.accept_invalid_certs, other.accept_invalid_certs);
    }
}

/// `[oauth]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthSection {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Coalesce concurrent refreshes of the same refresh token.
    pub single_flight_refresh: Option<bool>,
}

impl OAuthSection {
    fn merge(&mut self, other: Self) {
        overlay(&mut self.client_id, other.client_id);
        overlay(&mut self.client_secret, other.client_secret);
        overlay(&mut self.single_flight_refresh, other.single_flight_refresh);
    }
}

/// `[session]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    /// Secret the cookie encryption key is derived from.
    pub secret: Option<String>,
    pub cookie_name: Option<String>,
    /// Force the `Secure` cookie attribute on or off.
    pub secure: Option<bool>,
    /// Lifetime of a sealed session in seconds; `0` disables expiry.
    pub ttl_secs: Option<u64>,
}

impl SessionSection {
    fn merge(&mut self, other: Self) {
        overlay(&mut self.secret, other.secret);
        overlay(&mut self.cookie_name, other.cookie_name);
        overlay(&mut self.secure, other.secure);
        overlay(&mut self.ttl_secs, other.ttl_secs);
    }
}
