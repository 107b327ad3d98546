//! OAuth 2.0 authorization-code flow against the Firefly III authorization server.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use firegate_session::CredentialRecord;
use reqwest::{Client, header};
use serde::{Deserialize, Serialize};

use crate::error::{OAuthError, Result};

/// Authorization endpoint path, relative to the auth base URL.
pub const AUTHORIZE_PATH: &str = "/oauth/authorize";

/// Token endpoint path, relative to the auth base URL.
pub const TOKEN_PATH: &str = "/oauth/token";

/// Scope requested at login (all scopes the client may hold).
pub const DEFAULT_SCOPE: &str = "*";

/// OAuth client configuration.
#[derive(Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Base URL of the authorization server, without trailing slash.
    pub auth_base_url: String,
    pub scope: String,
}

impl OAuthConfig {
    pub fn new(
        auth_base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            auth_base_url: auth_base_url.into().trim_end_matches('/').to_string(),
            scope: DEFAULT_SCOPE.to_string(),
        }
    }

    pub fn authorize_url(&self) -> String {
        format!("{}{}", self.auth_base_url, AUTHORIZE_PATH)
    }

    pub fn token_url(&self) -> String {
        format!("{}{}", self.auth_base_url, TOKEN_PATH)
    }
}

impl fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("auth_base_url", &self.auth_base_url)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Build the URL the browser is redirected to at login.
pub fn build_authorization_url(config: &OAuthConfig, redirect_uri: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("client_id", &config.client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("scope", &config.scope)
        .finish();

    format!("{}?{}", config.authorize_url(), query)
}

/// Build the HTTP client used for the token endpoint and the upstream API.
///
/// `accept_invalid_certs` turns off TLS certificate validation.
pub fn build_http_client(accept_invalid_certs: bool) -> Result<Client> {
    if accept_invalid_certs {
        tracing::warn!("TLS certificate validation is disabled for upstream connections");
    }

    Client::builder()
        .danger_accept_invalid_certs(accept_invalid_certs)
        .build()
        .map_err(|e| OAuthError::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Successful response from the token endpoint.
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime of the access token in seconds.
    pub expires_in: u64,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl TokenResponse {
    /// Turn the grant into a credential record, anchored at `received_at_ms`.
    pub fn into_record(self, received_at_ms: u64) -> CredentialRecord {
        CredentialRecord::from_grant(
            self.access_token,
            self.refresh_token,
            self.expires_in,
            received_at_ms,
        )
    }
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .finish()
    }
}

#[derive(Serialize)]
struct AuthorizationCodeRequest<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
    code: &'a str,
}

#[derive(Serialize)]
struct RefreshTokenRequest<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
    refresh_token: &'a str,
}

// ============================================================================
// TokenEndpoint Trait
// ============================================================================

/// The authorization server's token endpoint.
#[async_trait]
pub trait TokenEndpoint: Send + Sync + fmt::Debug {
    /// Exchange an authorization code (`grant_type=authorization_code`).
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<TokenResponse>;

    /// Exchange a refresh token (`grant_type=refresh_token`).
    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse>;
}

/// Shared token endpoint for use across async contexts.
pub type SharedTokenEndpoint = Arc<dyn TokenEndpoint>;

// ============================================================================
// HttpTokenEndpoint
// ============================================================================

/// Token endpoint reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTokenEndpoint {
    client: Client,
    config: OAuthConfig,
}

impl HttpTokenEndpoint {
    pub fn new(config: OAuthConfig, client: Client) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    async fn post_token<B: Serialize + Sync>(&self, body: &B, grant: &str) -> Result<TokenResponse> {
        let response = self
            .client
            .post(self.config.token_url())
            .header(header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| OAuthError::Network(format!("{} request failed: {}", grant, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(OAuthError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| OAuthError::Backend(format!("Failed to parse {} response: {}", grant, e)))
    }
}

#[async_trait]
impl TokenEndpoint for HttpTokenEndpoint {
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<TokenResponse> {
        let request = AuthorizationCodeRequest {
            grant_type: "authorization_code",
            client_id: &self.config.client_id,
            client_secret: &self.config.client_secret,
            redirect_uri,
            code,
        };
        self.post_token(&request, "authorization_code").await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse> {
        let request = RefreshTokenRequest {
            grant_type: "refresh_token",
            client_id: &self.config.client_id,
            client_secret: &self.config.client_secret,
            refresh_token,
        };
        self.post_token(&request, "refresh_token").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base: &str) -> OAuthConfig {
        OAuthConfig::new(base, "client-7", "client-secret")
    }

    fn endpoint(base: &str) -> HttpTokenEndpoint {
        HttpTokenEndpoint::new(config(base), Client::new())
    }

    #[test]
    fn test_authorization_url() {
        let url = build_authorization_url(
            &config("https://firefly.example.com/"),
            "https://app.example.com/auth/callback",
        );

        assert_eq!(
            url,
            "https://firefly.example.com/oauth/authorize?client_id=client-7\
             &redirect_uri=https%3A%2F%2Fapp.example.com%2Fauth%2Fcallback\
             &response_type=code&scope=*"
        );
    }

    #[test]
    fn test_config_debug_hides_secret() {
        let debug = format!("{:?}", config("https://firefly.example.com"));
        assert!(!debug.contains("client-secret"));
        assert!(debug.contains("client-7"));
    }

    #[test]
    fn test_token_response_into_record() {
        let tokens: TokenResponse = serde_json::from_value(json!({
            "token_type": "Bearer",
            "expires_in": 60,
            "access_token": "a",
            "refresh_token": "r"
        }))
        .unwrap();

        let record = tokens.into_record(5_000);
        assert_eq!(record.access_token, "a");
        assert_eq!(record.refresh_token, "r");
        assert_eq!(record.expires_at, 65_000);
    }

    #[test]
    fn test_token_response_requires_refresh_token() {
        let parsed = serde_json::from_value::<TokenResponse>(json!({
            "expires_in": 60,
            "access_token": "a"
        }));
        assert!(parsed.is_err());
    }

    #[tokio::test]
    async fn test_exchange_code_posts_authorization_code_grant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(body_partial_json(json!({
                "grant_type": "authorization_code",
                "client_id": "client-7",
                "client_secret": "client-secret",
                "redirect_uri": "http://localhost:3000/auth/callback",
                "code": "code-123"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token_type": "Bearer",
                "expires_in": 3600,
                "access_token": "access-1",
                "refresh_token": "refresh-1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tokens = endpoint(&server.uri())
            .exchange_code("code-123", "http://localhost:3000/auth/callback")
            .await
            .unwrap();

        assert_eq!(tokens.access_token, "access-1");
        assert_eq!(tokens.refresh_token, "refresh-1");
        assert_eq!(tokens.expires_in, 3600);
    }

    #[tokio::test]
    async fn test_refresh_posts_refresh_grant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(body_partial_json(json!({
                "grant_type": "refresh_token",
                "client_id": "client-7",
                "client_secret": "client-secret",
                "refresh_token": "refresh-1"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "expires_in": 3600,
                "access_token": "access-2",
                "refresh_token": "refresh-2"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tokens = endpoint(&server.uri()).refresh("refresh-1").await.unwrap();
        assert_eq!(tokens.access_token, "access-2");
        assert_eq!(tokens.refresh_token, "refresh-2");
    }

    #[tokio::test]
    async fn test_rejected_grant_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant"
            })))
            .mount(&server)
            .await;

        let err = endpoint(&server.uri()).refresh("revoked").await.unwrap_err();
        match err {
            OAuthError::Rejected { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("invalid_grant"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_backend_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
            .mount(&server)
            .await;

        let err = endpoint(&server.uri())
            .exchange_code("c", "http://localhost/auth/callback")
            .await
            .unwrap_err();
        assert!(matches!(err, OAuthError::Backend(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        // Nothing listens on port 9 on loopback.
        let err = endpoint("http://127.0.0.1:9")
            .refresh("r")
            .await
            .unwrap_err();
        assert!(matches!(err, OAuthError::Network(_)));
    }
}
