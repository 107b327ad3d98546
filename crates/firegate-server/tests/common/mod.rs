//! Common test utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use reqwest::{Client, header, redirect};
use serde_json::json;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use firegate_config::{FiregateConfig, ResolvedConfig};
use firegate_server::Server;

pub const CLIENT_ID: &str = "7";
pub const CLIENT_SECRET: &str = "integration-client-secret";
pub const SESSION_SECRET: &str = "integration-session-secret-0123456789";
pub const COOKIE_NAME: &str = "firefly-iii-session";

/// A proxy running in the background in front of a mock Firefly III.
///
/// The mock serves both the OAuth endpoints and the API.
pub struct TestServer {
    /// The proxy's address.
    pub addr: SocketAddr,
    /// Client that does not follow redirects or keep cookies.
    pub client: Client,
    /// Mock Firefly III (authorization server and API).
    pub firefly: MockServer,
    /// Handle to the server task.
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a proxy with default settings.
    pub async fn start() -> Result<Self> {
        Self::start_with(|_| {}).await
    }

    /// Start a proxy, adjusting the config layer first.
    pub async fn start_with(customize: impl FnOnce(&mut FiregateConfig)) -> Result<Self> {
        let firefly = MockServer::start().await;
        let addr = find_available_port().await?;

        let mut config = FiregateConfig::new();
        config.server.bind = Some(addr.to_string());
        config.server.request_logging = Some(false);
        config.upstream.base_url = Some(firefly.uri());
        config.oauth.client_id = Some(CLIENT_ID.to_string());
        config.oauth.client_secret = Some(CLIENT_SECRET.to_string());
        config.session.secret = Some(SESSION_SECRET.to_string());
        customize(&mut config);

        let resolved = ResolvedConfig::resolve(config)?;
        let server = Server::from_config(&resolved)?;
        let handle = tokio::spawn(async move {
            let _ = server.run_on(addr).await;
        });

        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .build()?;
        wait_for_server(&client, addr).await?;

        Ok(Self {
            addr,
            client,
            firefly,
            _handle: handle,
        })
    }

    /// Get the base URL for the proxy.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    /// The redirect URI the proxy derives for requests addressed to it.
    pub fn redirect_uri(&self) -> String {
        format!("{}/auth/callback", self.base_url())
    }

    /// Make the token endpoint answer the authorization-code grant.
    pub async fn mock_code_exchange(&self, access: &str, refresh: &str, expires_in: u64) {
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(body_partial_json(json!({
                "grant_type": "authorization_code",
                "client_id": CLIENT_ID,
                "client_secret": CLIENT_SECRET,
                "redirect_uri": self.redirect_uri(),
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token_type": "Bearer",
                "expires_in": expires_in,
                "access_token": access,
                "refresh_token": refresh,
            })))
            .mount(&self.firefly)
            .await;
    }

    /// Log in through `/auth/callback` and return the `Cookie` header value.
    pub async fn login(&self, access: &str, refresh: &str, expires_in: u64) -> Result<String> {
        self.mock_code_exchange(access, refresh, expires_in).await;

        let resp = self
            .client
            .get(self.url("/auth/callback?code=integration-code"))
            .send()
            .await?;
        anyhow::ensure!(
            resp.status().as_u16() == 302,
            "login failed with {}",
            resp.status()
        );

        session_cookie(&resp).ok_or_else(|| anyhow::anyhow!("login set no session cookie"))
    }

    /// GET through the tunnel with a session cookie.
    pub fn proxy_get(&self, path: &str, cookie: &str) -> reqwest::RequestBuilder {
        self.client
            .get(self.url(&format!("/proxy/{}", path)))
            .header(header::COOKIE, cookie)
    }
}

/// `name=value` of the session cookie set by `resp`, if it set one.
pub fn session_cookie(resp: &reqwest::Response) -> Option<String> {
    set_cookie(resp)
        .and_then(|c| c.split(';').next().map(str::to_string))
        .filter(|c| c != &format!("{}=", COOKIE_NAME))
}

/// Raw `Set-Cookie` header of `resp`.
pub fn set_cookie(resp: &reqwest::Response) -> Option<String> {
    resp.headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Find an available port for the test server.
async fn find_available_port() -> Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(addr)
}

/// Wait for the server to become ready.
async fn wait_for_server(client: &Client, addr: SocketAddr) -> Result<()> {
    let url = format!("http://{}/health", addr);

    let result = timeout(Duration::from_secs(5), async {
        loop {
            match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => return,
                _ => tokio::time::sleep(Duration::from_millis(50)).await,
            }
        }
    })
    .await;

    match result {
        Ok(()) => Ok(()),
        Err(_) => anyhow::bail!("Timeout waiting for server to start"),
    }
}
