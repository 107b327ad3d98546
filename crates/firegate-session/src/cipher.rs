//! AES-256-GCM sealing for cookie payloads.

use std::fmt;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};

use crate::error::{Result, SessionError};

/// Prefix marking a sealed value produced by this cipher.
pub const SEAL_PREFIX: &str = "fg1.";

/// Minimum length of the session secret, in characters.
pub const MIN_SECRET_LEN: usize = 32;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Encrypts and authenticates JSON payloads with a key derived from a secret.
///
/// Sealed layout: `fg1.` followed by base64url(nonce || ciphertext || tag).
pub struct SessionCipher {
    cipher: Aes256Gcm,
}

impl SessionCipher {
    /// Derive the cipher key from a secret of at least [`MIN_SECRET_LEN`] characters.
    pub fn from_secret(secret: &str) -> Result<Self> {
        if secret.chars().count() < MIN_SECRET_LEN {
            return Err(SessionError::InvalidSecret(format!(
                "must be at least {} characters",
                MIN_SECRET_LEN
            )));
        }

        let key = Sha256::digest(secret.as_bytes());
        let cipher = Aes256Gcm::new_from_slice(key.as_slice())
            .map_err(|e| SessionError::InvalidSecret(e.to_string()))?;

        Ok(Self { cipher })
    }

    /// Seal a serializable value.
    pub fn seal<T: Serialize>(&self, value: &T) -> Result<String> {
        let payload = serde_json::to_vec(value)?;

        let mut nonce = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), payload.as_ref())
            .map_err(|_| SessionError::Seal)?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);

        Ok(format!("{}{}", SEAL_PREFIX, URL_SAFE_NO_PAD.encode(out)))
    }

    /// Open a sealed value.
    pub fn unseal<T: DeserializeOwned>(&self, sealed: &str) -> Result<T> {
        let encoded = sealed
            .strip_prefix(SEAL_PREFIX)
            .ok_or_else(|| SessionError::Malformed("unknown seal prefix".to_string()))?;

        let raw = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|e| SessionError::Malformed(e.to_string()))?;

        if raw.len() < NONCE_LEN + TAG_LEN {
            return Err(SessionError::Malformed("sealed value too short".to_string()));
        }

        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| SessionError::Tampered)?;

        Ok(serde_json::from_slice(&plaintext)?)
    }
}

impl fmt::Debug for SessionCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCipher").finish_non_exhaustive()
    }
}
