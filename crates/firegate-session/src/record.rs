//! The credential record persisted in each session.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}

/// Access/refresh token pair and the absolute time the access token expires.
///
/// A record is only ever built from a fresh token response via
/// [`CredentialRecord::from_grant`], and it is replaced as a whole on refresh.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    pub access_token: String,
    pub refresh_token: String,
    /// Milliseconds since the Unix epoch.
    pub expires_at: u64,
}

impl CredentialRecord {
    /// Build a record from a token grant received at `received_at_ms`.
    pub fn from_grant(
        access_token: String,
        refresh_token: String,
        expires_in_secs: u64,
        received_at_ms: u64,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at: received_at_ms.saturating_add(expires_in_secs.saturating_mul(1000)),
        }
    }

    /// Whether the record carries an access token at all.
    pub fn has_access_token(&self) -> bool {
        !self.access_token.is_empty()
    }

    /// Whether the access token is expired at `now_ms`.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }

    /// Milliseconds of validity left at `now_ms` (zero once expired).
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.expires_at.saturating_sub(now_ms)
    }
}

// Tokens are bearer credentials; keep them out of logs.
impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
