//! Session token lifecycle.
//!
//! Completes the login (authorization code → credential record) and, on every
//! proxied request, decides whether the session's access token can be used as
//! is or must be refreshed first.

use firegate_session::{CredentialRecord, Session, now_millis};

use crate::error::{OAuthError, Result};
use crate::oauth::{SharedTokenEndpoint, TokenResponse};
use crate::single_flight::RefreshSingleFlight;

/// Manages the credential record held in a request's [`Session`].
#[derive(Debug)]
pub struct SessionTokenManager {
    endpoint: SharedTokenEndpoint,
    single_flight: Option<RefreshSingleFlight>,
}

impl SessionTokenManager {
    /// Create a manager that refreshes every expired session independently.
    pub fn new(endpoint: SharedTokenEndpoint) -> Self {
        Self {
            endpoint,
            single_flight: None,
        }
    }

    /// Coalesce concurrent refreshes of the same refresh token.
    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled.then(RefreshSingleFlight::new);
        self
    }

    pub fn single_flight_enabled(&self) -> bool {
        self.single_flight.is_some()
    }

    /// Exchange an authorization code and store the resulting record in `session`.
    ///
    /// `redirect_uri` must be exactly the one sent with the authorization request.
    pub async fn complete_login(
        &self,
        session: &mut Session,
        code: &str,
        redirect_uri: &str,
    ) -> Result<()> {
        let tokens = self.endpoint.exchange_code(code, redirect_uri).await?;
        let record = tokens.into_record(now_millis());

        tracing::info!(expires_at = record.expires_at, "Authorization code exchanged");
        session.set_user(record);
        Ok(())
    }

    /// Get credentials valid for immediate use, refreshing them if expired.
    pub async fn valid_credentials(&self, session: &mut Session) -> Result<CredentialRecord> {
        self.valid_credentials_at(session, now_millis()).await
    }

    /// Like [`valid_credentials`](Self::valid_credentials), judged at `now_ms`.
    ///
    /// On refresh failure the session is destroyed and
    /// [`OAuthError::SessionExpired`] returned.
    pub async fn valid_credentials_at(
        &self,
        session: &mut Session,
        now_ms: u64,
    ) -> Result<CredentialRecord> {
        let current = match session.user() {
            Some(user) if user.has_access_token() => user.clone(),
            _ => return Err(OAuthError::Unauthenticated),
        };

        if !current.is_expired_at(now_ms) {
            tracing::debug!(
                remaining_ms = current.remaining_ms(now_ms),
                "Access token still valid"
            );
            return Ok(current);
        }

        tracing::info!("Access token expired, refreshing");
        match self.refresh(&current.refresh_token).await {
            Ok(tokens) => {
                let record = tokens.into_record(now_millis());
                session.set_user(record.clone());
                tracing::info!(expires_at = record.expires_at, "Token refreshed successfully");
                Ok(record)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed, destroying session");
                session.destroy();
                Err(OAuthError::SessionExpired(e.to_string()))
            }
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse> {
        match &self.single_flight {
            Some(flight) => flight.refresh(&self.endpoint, refresh_token).await,
            None => self.endpoint.refresh(refresh_token).await,
        }
    }
}
