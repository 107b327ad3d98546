//! HTTP front end of the firegate proxy.
//!
//! A browser-facing backend-for-frontend for a Firefly III instance: the
//! browser logs in through the OAuth authorization-code flow, its tokens are
//! kept in an encrypted session cookie, and API calls made under `/proxy/`
//! are forwarded upstream with the session's bearer token.
//!
//! # Routes
//!
//! - `GET /auth/login` - redirect to the authorization server
//! - `GET /auth/callback` - exchange the code, set the session cookie
//! - `GET|POST /auth/logout` - clear the session cookie
//! - `GET|POST|PUT|DELETE /proxy/{*path}` - authenticated API tunnel
//! - `GET /health`
//!
//! # Example
//!
//! ```ignore
//! use firegate_server::Server;
//!
//! let resolved = firegate_config::ResolvedConfig::resolve(layers)?;
//! let server = Server::from_config(&resolved)?;
//! server.run().await?;
//! ```

pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use gateway::{ForwardRequest, Gateway, UpstreamResponse};
pub use logging::request_logging_middleware;
pub use routes::HealthResponse;
pub use state::AppState;

use std::net::SocketAddr;

use axum::{Router, body::Body, extract::DefaultBodyLimit, http::Request, middleware};
use firegate_config::ResolvedConfig;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// The firegate HTTP server.
pub struct Server {
    /// Application state.
    state: AppState,
}

impl Server {
    /// Create a server wired from a resolved config.
    pub fn from_config(resolved: &ResolvedConfig) -> Result<Self> {
        Ok(Self {
            state: AppState::from_resolved(resolved)?,
        })
    }

    /// Create a server from a pre-built application state.
    pub fn from_state(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        Router::new()
            .merge(routes::health_routes())
            .merge(routes::auth_routes())
            .merge(routes::proxy_routes())
            .layer(DefaultBodyLimit::max(self.state.config.max_body_size))
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                logging::request_logging_middleware,
            ))
            // Spans carry the path only; the callback query holds the code.
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    tracing::debug_span!(
                        "request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                }),
            )
            .with_state(self.state.clone())
    }

    /// Run the server.
    pub async fn run(self) -> Result<()> {
        let addr = self.state.config.bind_address;
        self.run_on(addr).await
    }

    /// Run the server on a specific address (useful for testing).
    pub async fn run_on(self, addr: SocketAddr) -> Result<()> {
        let router = self.router();

        info!("Starting server on {}", addr);

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| ServerError::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the configured bind address.
    pub fn bind_address(&self) -> SocketAddr {
        self.state.config.bind_address
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{StaticEndpoint, test_state, token_response};
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_server_health_endpoint() {
        let state = test_state(
            StaticEndpoint::ok(token_response("at", "rt", 3600)),
            "http://127.0.0.1:9",
        );
        let app = Server::from_state(state).router();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_body_limit() {
        let state = test_state(
            StaticEndpoint::ok(token_response("at", "rt", 3600)),
            "http://127.0.0.1:9",
        );
        let mut server = Server::from_state(state);
        server.state.config = std::sync::Arc::new(ServerConfig::new().with_max_body_size(16));

        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/proxy/transactions")
                    .body(Body::from(vec![b' '; 64]))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
