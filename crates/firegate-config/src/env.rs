//! Environment variable layer.

use crate::error::{ConfigError, Result};
use crate::types::FiregateConfig;

pub const ENV_API_URL: &str = "FIREFLY_III_API_URL";
pub const ENV_AUTH_URL: &str = "FIREFLY_III_AUTH_URL";
pub const ENV_CLIENT_ID: &str = "FIREFLY_III_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "FIREFLY_III_CLIENT_SECRET";
pub const ENV_SESSION_SECRET: &str = "SESSION_SECRET";
pub const ENV_BIND: &str = "FIREGATE_BIND";
pub const ENV_PUBLIC_URL: &str = "FIREGATE_PUBLIC_URL";
pub const ENV_ENVIRONMENT: &str = "FIREGATE_ENV";
pub const ENV_ACCEPT_INVALID_CERTS: &str = "FIREGATE_ACCEPT_INVALID_CERTS";
pub const ENV_SINGLE_FLIGHT_REFRESH: &str = "FIREGATE_SINGLE_FLIGHT_REFRESH";
pub const ENV_COOKIE_SECURE: &str = "FIREGATE_COOKIE_SECURE";

/// Build a config layer from the process environment.
pub fn from_env() -> Result<FiregateConfig> {
    from_env_with(|key| std::env::var(key).ok())
}

/// Build a config layer from an arbitrary variable lookup.
///
/// Empty values count as unset.
pub fn from_env_with(lookup: impl Fn(&str) -> Option<String>) -> Result<FiregateConfig> {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    let get_bool = |key: &str| get(key).map(|v| parse_bool(key, &v)).transpose();

    let mut config = FiregateConfig::new();

    config.server.bind = get(ENV_BIND);
    config.server.public_url = get(ENV_PUBLIC_URL);
    config.server.environment = get(ENV_ENVIRONMENT);

    config.upstream.base_url = get(ENV_API_URL);
    config.upstream.auth_base_url = get(ENV_AUTH_URL);
    config.upstream.accept_invalid_certs = get_bool(ENV_ACCEPT_INVALID_CERTS)?;

    config.oauth.client_id = get(ENV_CLIENT_ID);
    config.oauth.client_secret = get(ENV_CLIENT_SECRET);
    config.oauth.single_flight_refresh = get_bool(ENV_SINGLE_FLIGHT_REFRESH)?;

    config.session.secret = get(ENV_SESSION_SECRET);
    config.session.secure = get_bool(ENV_COOKIE_SECURE)?;

    Ok(config)
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::invalid(
            key,
            format!("expected a boolean, got '{}'", other),
        )),
    }
}
