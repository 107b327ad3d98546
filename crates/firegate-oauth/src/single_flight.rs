//! Coalescing of concurrent refresh exchanges.
//!
//! Two requests carrying the same expired session would otherwise each spend
//! the refresh token. With single-flight enabled the first caller starts the
//! exchange and later callers await the same result.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use crate::error::{OAuthError, Result};
use crate::oauth::{SharedTokenEndpoint, TokenResponse};

type InFlightRefresh = Shared<BoxFuture<'static, Result<TokenResponse>>>;
type InFlightMap = Arc<Mutex<HashMap<String, InFlightRefresh>>>;

/// In-flight refresh exchanges keyed by a digest of the refresh token.
///
/// Each exchange runs as its own task and removes its entry when it
/// finishes, so callers that give up waiting leave nothing behind.
#[derive(Default)]
pub struct RefreshSingleFlight {
    in_flight: InFlightMap,
}

impl RefreshSingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refresh `refresh_token`, joining an exchange already in flight for it.
    pub async fn refresh(
        &self,
        endpoint: &SharedTokenEndpoint,
        refresh_token: &str,
    ) -> Result<TokenResponse> {
        let key = token_key(refresh_token);

        let exchange = {
            let mut in_flight = self.in_flight.lock();
            match in_flight.get(&key) {
                Some(existing) => {
                    tracing::debug!("Joining in-flight token refresh");
                    existing.clone()
                }
                None => {
                    let exchange = spawn_exchange(
                        Arc::clone(&self.in_flight),
                        key.clone(),
                        endpoint.clone(),
                        refresh_token.to_string(),
                    );
                    in_flight.insert(key, exchange.clone());
                    exchange
                }
            }
        };

        exchange.await
    }

    /// Number of exchanges currently pending.
    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().len()
    }
}

impl fmt::Debug for RefreshSingleFlight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshSingleFlight")
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

/// Run one exchange to completion whether or not anyone is still waiting.
///
/// The caller inserts the returned future while holding the map lock, so the
/// task's removal cannot run before the insert.
fn spawn_exchange(
    in_flight: InFlightMap,
    key: String,
    endpoint: SharedTokenEndpoint,
    refresh_token: String,
) -> InFlightRefresh {
    let task = tokio::spawn(async move {
        let result = endpoint.refresh(&refresh_token).await;
        in_flight.lock().remove(&key);
        result
    });

    async move {
        task.await
            .unwrap_or_else(|e| Err(OAuthError::Backend(format!("Refresh task failed: {}", e))))
    }
    .boxed()
    .shared()
}

/// The raw token is never used as a map key.
fn token_key(refresh_token: &str) -> String {
    Sha256::digest(refresh_token.as_bytes())
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
