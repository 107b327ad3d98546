//! Forwarding gateway to the upstream Firefly III API.
//!
//! Re-issues a proxied request against `{upstream}{api_prefix}/{path}` with
//! the session's bearer token and hands back whatever the upstream answered.
//! Upstream error statuses are results, not failures; only transport errors
//! surface as [`ServerError::UpstreamUnreachable`].

use axum::{
    body::Bytes,
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use reqwest::Client;

use crate::error::{Result, ServerError};

/// Media type of everything sent through the tunnel.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A request to replay upstream.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub method: Method,
    /// Raw path after the proxy prefix, still percent-encoded.
    pub path: String,
    /// Raw query string, without the leading `?`.
    pub query: Option<String>,
    /// Body for `POST`/`PUT`; `None` sends no body.
    pub body: Option<Bytes>,
}

impl ForwardRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            body: None,
        }
    }

    pub fn with_query(mut self, query: Option<&str>) -> Self {
        self.query = query.map(str::to_string);
        self
    }

    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }
}

/// What the upstream answered, relayed as is.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub content_type: HeaderValue,
    pub body: Bytes,
}

impl IntoResponse for UpstreamResponse {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, self.content_type)],
            self.body,
        )
            .into_response()
    }
}

/// Authenticated HTTP client for the upstream API.
#[derive(Debug, Clone)]
pub struct Gateway {
    client: Client,
    api_root: String,
}

impl Gateway {
    /// Create a gateway for `{upstream_base}{api_prefix}`.
    pub fn new(client: Client, upstream_base: &str, api_prefix: &str) -> Self {
        Self {
            client,
            api_root: format!("{}{}", upstream_base.trim_end_matches('/'), api_prefix),
        }
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    /// Upstream URL for a path suffix and raw query, by plain concatenation.
    pub fn target_url(&self, path: &str, query: Option<&str>) -> String {
        match query.filter(|q| !q.is_empty()) {
            Some(query) => format!("{}/{}?{}", self.api_root, path, query),
            None => format!("{}/{}", self.api_root, path),
        }
    }

    /// Send `request` upstream with `access_token` as bearer credentials.
    pub async fn forward(
        &self,
        request: ForwardRequest,
        access_token: &str,
    ) -> Result<UpstreamResponse> {
        let url = self.target_url(&request.path, request.query.as_deref());

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .bearer_auth(access_token)
            .header(header::CONTENT_TYPE, JSON_CONTENT_TYPE)
            .header(header::ACCEPT, JSON_CONTENT_TYPE);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ServerError::UpstreamUnreachable(e.without_url().to_string()))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static(JSON_CONTENT_TYPE));

        let body = response.bytes().await.map_err(|e| {
            ServerError::UpstreamUnreachable(format!(
                "reading response body: {}",
                e.without_url()
            ))
        })?;

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            status = status.as_u16(),
            bytes = body.len(),
            "Upstream responded"
        );

        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, header as header_eq, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway(base: &str) -> Gateway {
        Gateway::new(Client::new(), base, "/api/v1")
    }

    #[test]
    fn test_target_url() {
        let gw = gateway("https://firefly.example.com/");
        assert_eq!(gw.api_root(), "https://firefly.example.com/api/v1");
        assert_eq!(
            gw.target_url("accounts", Some("type=asset&page=2")),
            "https://firefly.example.com/api/v1/accounts?type=asset&page=2"
        );
        assert_eq!(
            gw.target_url("accounts/12", None),
            "https://firefly.example.com/api/v1/accounts/12"
        );
        assert_eq!(
            gw.target_url("accounts", Some("")),
            "https://firefly.example.com/api/v1/accounts"
        );
        assert_eq!(
            gw.target_url("tags/a%2Fb", None),
            "https://firefly.example.com/api/v1/tags/a%2Fb"
        );
    }

    #[tokio::test]
    async fn test_forward_get_with_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/accounts"))
            .and(query_param("type", "asset"))
            .and(header_eq("authorization", "Bearer at-1"))
            .and(header_eq("accept", "application/json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(r#"[{"id":"1"},{"id":"2"}]"#, "application/json"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let response = gateway(&server.uri())
            .forward(
                ForwardRequest::new(Method::GET, "accounts").with_query(Some("type=asset")),
                "at-1",
            )
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.content_type, "application/json");
        assert_eq!(&response.body[..], br#"[{"id":"1"},{"id":"2"}]"#);
    }

    #[tokio::test]
    async fn test_forward_post_body_unchanged() {
        let server = MockServer::start().await;
        let payload = r#"{"name":"Groceries","amount":"12.50"}"#;
        Mock::given(method("POST"))
            .and(path("/api/v1/transactions"))
            .and(header_eq("content-type", "application/json"))
            .and(body_string(payload))
            .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
            .expect(1)
            .mount(&server)
            .await;

        let response = gateway(&server.uri())
            .forward(
                ForwardRequest::new(Method::POST, "transactions")
                    .with_body(Bytes::from_static(payload.as_bytes())),
                "at-1",
            )
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_error_statuses_are_relayed() {
        let server = MockServer::start().await;
        let not_found = r#"{"message":"Resource not found","exception":"NotFoundHttpException"}"#;
        let invalid = r#"{"message":"The given data was invalid.","errors":{"name":["required"]}}"#;

        Mock::given(method("GET"))
            .and(path("/api/v1/accounts/999"))
            .respond_with(ResponseTemplate::new(404).set_body_raw(not_found, "application/json"))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/api/v1/accounts/1"))
            .respond_with(ResponseTemplate::new(422).set_body_raw(invalid, "application/json"))
            .mount(&server)
            .await;

        let gw = gateway(&server.uri());

        let response = gw
            .forward(ForwardRequest::new(Method::GET, "accounts/999"), "at")
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(&response.body[..], not_found.as_bytes());

        let response = gw
            .forward(
                ForwardRequest::new(Method::PUT, "accounts/1").with_body(Bytes::from_static(b"{}")),
                "at",
            )
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(&response.body[..], invalid.as_bytes());
    }

    #[tokio::test]
    async fn test_missing_content_type_defaults_to_json() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/accounts/1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let response = gateway(&server.uri())
            .forward(ForwardRequest::new(Method::DELETE, "accounts/1"), "at")
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::NO_CONTENT);
        assert_eq!(response.content_type, JSON_CONTENT_TYPE);
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_upstream() {
        // Bind and drop to get a port with nothing listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = gateway(&format!("http://{}", addr))
            .forward(ForwardRequest::new(Method::GET, "about"), "at")
            .await
            .unwrap_err();

        assert!(matches!(err, ServerError::UpstreamUnreachable(_)));
    }
}
