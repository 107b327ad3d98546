//! Server configuration.

use std::net::{Ipv4Addr, SocketAddr};

use firegate_config::ResolvedConfig;

pub use firegate_config::resolver::DEFAULT_MAX_BODY_SIZE;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3000;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to.
    pub bind_address: SocketAddr,

    /// Externally visible origin, e.g. `https://budget.example.com`.
    /// When `None` the OAuth redirect URI is derived from request headers.
    pub public_url: Option<String>,

    /// Enable request logging.
    pub request_logging: bool,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            public_url: None,
            request_logging: true,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the server settings out of a resolved config.
    pub fn from_resolved(resolved: &ResolvedConfig) -> Self {
        Self {
            bind_address: resolved.bind_address,
            public_url: resolved.public_url.clone(),
            request_logging: resolved.request_logging,
            max_body_size: resolved.max_body_size,
        }
    }

    /// Set the bind address.
    pub fn with_bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = addr;
        self
    }

    /// Set the public origin used for the OAuth redirect URI.
    pub fn with_public_url(mut self, url: impl Into<String>) -> Self {
        self.public_url = Some(url.into().trim_end_matches('/').to_string());
        self
    }

    /// Enable or disable request logging.
    pub fn with_request_logging(mut self, enabled: bool) -> Self {
        self.request_logging = enabled;
        self
    }

    /// Set the maximum request body size.
    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }
}
