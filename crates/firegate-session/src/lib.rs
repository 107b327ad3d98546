//! Encrypted cookie sessions for the firegate proxy.
//!
//! The whole of a browser's authentication state is a single
//! [`CredentialRecord`] sealed into one cookie. There is no server-side
//! session table: every request reads the cookie, and a request that changes
//! the record writes the cookie back.
//!
//! # Components
//!
//! - [`record`] - the credential record and the clock it is measured against
//! - [`cipher`] - AES-256-GCM sealing of arbitrary JSON payloads
//! - [`codec`] - cookie parsing, `Set-Cookie` generation and per-request [`Session`] state

pub mod cipher;
pub mod codec;
pub mod error;
pub mod record;

pub use cipher::{MIN_SECRET_LEN, SessionCipher};
pub use codec::{
    COOKIE_EXPIRY_SKEW_SECS, DEFAULT_COOKIE_NAME, DEFAULT_SESSION_TTL_SECS, Session, SessionChange, SessionCodec,
    SessionCookieConfig, SessionPayload,
};
pub use error::{Result, SessionError};
pub use record::{CredentialRecord, now_millis};
