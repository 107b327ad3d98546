//! Cookie codec and per-request session state.

use http::HeaderMap;
use http::header::{COOKIE, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::cipher::SessionCipher;
use crate::error::{Result, SessionError};
use crate::record::{CredentialRecord, now_millis};

/// Default session cookie name.
pub const DEFAULT_COOKIE_NAME: &str = "firefly-iii-session";

/// Default lifetime of a sealed session (14 days).
pub const DEFAULT_SESSION_TTL_SECS: u64 = 14 * 24 * 60 * 60;

/// The browser drops the cookie slightly before the seal itself expires.
pub const COOKIE_EXPIRY_SKEW_SECS: u64 = 60;

/// Cookie attributes for the session cookie.
#[derive(Debug, Clone)]
pub struct SessionCookieConfig {
    pub cookie_name: String,
    /// Add the `Secure` attribute.
    pub secure: bool,
    /// Lifetime of a sealed session in seconds; `0` disables the check.
    pub ttl_secs: u64,
}

impl Default for SessionCookieConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            secure: false,
            ttl_secs: DEFAULT_SESSION_TTL_SECS,
        }
    }
}

/// What gets sealed into the cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionPayload {
    #[serde(default)]
    pub user: Option<CredentialRecord>,
    /// Seal time, seconds since the Unix epoch.
    pub iat: u64,
}

/// How a session changed while handling a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionChange {
    #[default]
    Unchanged,
    Saved,
    Destroyed,
}

/// Session state for a single request.
///
/// Loaded from the cookie at request start; any change is written back as
/// one `Set-Cookie` header on the response.
#[derive(Debug, Clone, Default)]
pub struct Session {
    user: Option<CredentialRecord>,
    change: SessionChange,
}

impl Session {
    /// An empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// A session as loaded from an existing cookie.
    pub fn with_user(user: CredentialRecord) -> Self {
        Self {
            user: Some(user),
            change: SessionChange::Unchanged,
        }
    }

    /// The stored credential record, if any.
    pub fn user(&self) -> Option<&CredentialRecord> {
        self.user.as_ref()
    }

    /// Replace the credential record.
    pub fn set_user(&mut self, user: CredentialRecord) {
        self.user = Some(user);
        self.change = SessionChange::Saved;
    }

    /// Remove the credential record and expire the cookie.
    pub fn destroy(&mut self) {
        self.user = None;
        self.change = SessionChange::Destroyed;
    }

    pub fn change(&self) -> SessionChange {
        self.change
    }

    pub fn is_modified(&self) -> bool {
        self.change != SessionChange::Unchanged
    }
}

/// Reads and writes the session cookie.
#[derive(Debug)]
pub struct SessionCodec {
    cipher: SessionCipher,
    config: SessionCookieConfig,
}

impl SessionCodec {
    /// Create a codec keyed by `secret`.
    pub fn new(secret: &str, config: SessionCookieConfig) -> Result<Self> {
        Ok(Self {
            cipher: SessionCipher::from_secret(secret)?,
            config,
        })
    }

    /// Get the cookie config.
    pub fn config(&self) -> &SessionCookieConfig {
        &self.config
    }

    /// Seal a payload into a cookie value.
    pub fn seal(&self, payload: &SessionPayload) -> Result<String> {
        self.cipher.seal(payload)
    }

    /// Open a cookie value, rejecting payloads older than the TTL.
    pub fn unseal(&self, sealed: &str) -> Result<SessionPayload> {
        self.unseal_at(sealed, now_secs())
    }

    fn unseal_at(&self, sealed: &str, now_secs: u64) -> Result<SessionPayload> {
        let payload: SessionPayload = self.cipher.unseal(sealed)?;

        if self.config.ttl_secs > 0 && payload.iat.saturating_add(self.config.ttl_secs) <= now_secs
        {
            return Err(SessionError::Expired);
        }

        Ok(payload)
    }

    /// Load the session from request headers.
    ///
    /// A missing, tampered or expired cookie yields an empty session.
    pub fn load(&self, headers: &HeaderMap) -> Session {
        let Some(value) = cookie_value(headers, &self.config.cookie_name) else {
            return Session::new();
        };

        match self.unseal(&value) {
            Ok(SessionPayload {
                user: Some(user), ..
            }) => Session::with_user(user),
            Ok(_) => Session::new(),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring unusable session cookie");
                Session::new()
            }
        }
    }

    /// The `Set-Cookie` value reflecting the session's change, if any.
    pub fn set_cookie(&self, session: &Session) -> Result<Option<HeaderValue>> {
        let cookie = match (session.change(), session.user()) {
            (SessionChange::Unchanged, _) => return Ok(None),
            (SessionChange::Saved, Some(user)) => {
                let payload = SessionPayload {
                    user: Some(user.clone()),
                    iat: now_secs(),
                };
                let max_age = (self.config.ttl_secs > 0).then(|| cookie_max_age(self.config.ttl_secs));
                self.build_set_cookie(&self.seal(&payload)?, max_age)
            }
            (SessionChange::Saved, None) | (SessionChange::Destroyed, _) => {
                self.build_set_cookie("", Some(0))
            }
        };

        HeaderValue::from_str(&cookie)
            .map(Some)
            .map_err(|e| SessionError::Header(e.to_string()))
    }

    fn build_set_cookie(&self, value: &str, max_age_secs: Option<u64>) -> String {
        let mut out = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            self.config.cookie_name, value
        );
        if let Some(max_age) = max_age_secs {
            out.push_str(&format!("; Max-Age={}", max_age));
        }
        if self.config.secure {
            out.push_str("; Secure");
        }
        out
    }
}

/// Find a cookie by name across all `Cookie` headers.
fn cookie_value(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|header| header.split(';'))
        .find_map(|part| {
            let (name, value) = part.trim().split_once('=')?;
            (name == cookie_name && !value.is_empty()).then(|| value.to_string())
        })
}

/// `Max-Age` for a sealed session. Lifetimes too short to take the skew off
/// are used as they are, so the cookie is never written already expired.
fn cookie_max_age(ttl_secs: u64) -> u64 {
    if ttl_secs > COOKIE_EXPIRY_SKEW_SECS {
        ttl_secs - COOKIE_EXPIRY_SKEW_SECS
    } else {
        ttl_secs
    }
}

fn now_secs() -> u64 {
    now_millis() / 1000
}
