//! Validation of merged layers into the settings the server runs with.

use std::fmt;
use std::net::SocketAddr;

use crate::env::{ENV_API_URL, ENV_CLIENT_ID, ENV_CLIENT_SECRET, ENV_SESSION_SECRET};
use crate::error::{ConfigError, Result};
use crate::types::{
    FiregateConfig, OAuthSection, ServerSection, SessionSection, UpstreamSection,
};

/// Default listen address.
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Default versioned API prefix on the upstream.
pub const DEFAULT_API_PREFIX: &str = "/api/v1";

/// Default max body size for proxied requests (10 MB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

pub use firegate_session::{
    COOKIE_EXPIRY_SKEW_SECS, DEFAULT_COOKIE_NAME, DEFAULT_SESSION_TTL_SECS,
    MIN_SECRET_LEN as MIN_SESSION_SECRET_LEN,
};

const PRODUCTION: &str = "production";

/// Fully validated configuration.
#[derive(Clone)]
pub struct ResolvedConfig {
    pub bind_address: SocketAddr,
    pub public_url: Option<String>,
    pub max_body_size: usize,
    pub request_logging: bool,

    pub upstream_base_url: String,
    pub api_prefix: String,
    pub auth_base_url: String,
    pub accept_invalid_certs: bool,

    pub client_id: String,
    pub client_secret: String,
    pub single_flight_refresh: bool,

    pub session_secret: String,
    pub cookie_name: String,
    pub secure_cookies: bool,
    pub session_ttl_secs: u64,
}

impl ResolvedConfig {
    /// Validate a merged config, applying defaults.
    pub fn resolve(config: FiregateConfig) -> Result<Self> {
        let FiregateConfig {
            server,
            upstream,
            oauth,
            session,
        } = config;

        let upstream_base_url = normalize_base_url(
            "upstream.base_url",
            &required(upstream.base_url, "upstream.base_url", ENV_API_URL)?,
        )?;
        let auth_base_url = match upstream.auth_base_url {
            Some(url) => normalize_base_url("upstream.auth_base_url", &url)?,
            None => upstream_base_url.clone(),
        };

        let bind = server.bind.unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind_address = bind
            .parse()
            .map_err(|e| ConfigError::invalid("server.bind", format!("{} ({})", bind, e)))?;

        let public_url = server
            .public_url
            .map(|url| normalize_base_url("server.public_url", &url))
            .transpose()?;

        let session_secret = required(session.secret, "session.secret", ENV_SESSION_SECRET)?;
        if session_secret.chars().count() < MIN_SESSION_SECRET_LEN {
            return Err(ConfigError::invalid(
                "session.secret",
                format!("must be at least {} characters", MIN_SESSION_SECRET_LEN),
            ));
        }

        let session_ttl_secs = session.ttl_secs.unwrap_or(DEFAULT_SESSION_TTL_SECS);
        if session_ttl_secs != 0 && session_ttl_secs <= COOKIE_EXPIRY_SKEW_SECS {
            return Err(ConfigError::invalid(
                "session.ttl_secs",
                format!(
                    "must be 0 (no expiry) or more than {} seconds",
                    COOKIE_EXPIRY_SKEW_SECS
                ),
            ));
        }

        let is_production = server
            .environment
            .as_deref()
            .is_some_and(|env| env.eq_ignore_ascii_case(PRODUCTION));

        Ok(Self {
            bind_address,
            public_url,
            max_body_size: server.max_body_size.unwrap_or(DEFAULT_MAX_BODY_SIZE),
            request_logging: server.request_logging.unwrap_or(true),
            upstream_base_url,
            api_prefix: normalize_prefix(upstream.api_prefix.as_deref()),
            auth_base_url,
            accept_invalid_certs: upstream.accept_invalid_certs.unwrap_or(false),
            client_id: required(oauth.client_id, "oauth.client_id", ENV_CLIENT_ID)?,
            client_secret: required(oauth.client_secret, "oauth.client_secret", ENV_CLIENT_SECRET)?,
            single_flight_refresh: oauth.single_flight_refresh.unwrap_or(false),
            session_secret,
            cookie_name: session
                .cookie_name
                .unwrap_or_else(|| DEFAULT_COOKIE_NAME.to_string()),
            secure_cookies: session.secure.unwrap_or(is_production),
            session_ttl_secs,
        })
    }

    /// Full upstream API root: base URL plus versioned prefix.
    pub fn api_root(&self) -> String {
        format!("{}{}", self.upstream_base_url, self.api_prefix)
    }

    /// Back to a config layer, with secrets redacted, for display.
    pub fn to_redacted_config(&self) -> FiregateConfig {
        FiregateConfig {
            server: ServerSection {
                bind: Some(self.bind_address.to_string()),
                public_url: self.public_url.clone(),
                max_body_size: Some(self.max_body_size),
                request_logging: Some(self.request_logging),
                environment: None,
            },
            upstream: UpstreamSection {
                base_url: Some(self.upstream_base_url.clone()),
                api_prefix: Some(self.api_prefix.clone()),
                auth_base_url: Some(self.auth_base_url.clone()),
                accept_invalid_certs: Some(self.accept_invalid_certs),
            },
            oauth: OAuthSection {
                client_id: Some(self.client_id.clone()),
                client_secret: Some(self.client_secret.clone()),
                single_flight_refresh: Some(self.single_flight_refresh),
            },
            session: SessionSection {
                secret: Some(self.session_secret.clone()),
                cookie_name: Some(self.cookie_name.clone()),
                secure: Some(self.secure_cookies),
                ttl_secs: Some(self.session_ttl_secs),
            },
        }
        .redacted()
    }
}

impl fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("bind_address", &self.bind_address)
            .field("public_url", &self.public_url)
            .field("upstream_base_url", &self.upstream_base_url)
            .field("api_prefix", &self.api_prefix)
            .field("auth_base_url", &self.auth_base_url)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .field("client_id", &self.client_id)
            .field("single_flight_refresh", &self.single_flight_refresh)
            .field("cookie_name", &self.cookie_name)
            .field("secure_cookies", &self.secure_cookies)
            .finish_non_exhaustive()
    }
}

fn required(value: Option<String>, field: &str, env_var: &str) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingField {
            field: field.to_string(),
            env_var: env_var.to_string(),
        })
}

/// Require an absolute http(s) URL and strip trailing slashes.
fn normalize_base_url(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim().trim_end_matches('/');
    let parsed = url::Url::parse(trimmed).map_err(|e| ConfigError::invalid(field, e.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::invalid(field, "must be an http(s) URL"));
    }

    Ok(trimmed.to_string())
}

/// Leading slash, no trailing slash.
fn normalize_prefix(prefix: Option<&str>) -> String {
    let raw = prefix.unwrap_or(DEFAULT_API_PREFIX).trim().trim_matches('/');
    if raw.is_empty() {
        String::new()
    } else {
        format!("/{}", raw)
    }
}
