//! Signed session tokens.
//!
//! # Token Format
//!
//! ```text
//! token     = "{session_id}.{signature}"
//! signature = hex(HMAC-SHA256(secret_key, session_id))
//! ```
//!
//! The session ID is 32 random bytes, hex-encoded. Signature verification
//! uses constant-time comparison.

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

/// HMAC-SHA256 type alias
type HmacSha256 = Hmac<Sha256>;

/// Number of random bytes in a session ID.
pub const SESSION_ID_BYTES: usize = 32;

/// Reasons a presented token is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Not of the form `id.signature`, or not hex
    #[error("Malformed session token")]
    Malformed,

    /// Signature does not match the ID
    #[error("Invalid session token signature")]
    InvalidSignature,
}

/// Issues and verifies session tokens.
#[derive(Clone)]
pub struct SessionSigner {
    /// Secret key for HMAC computation
    secret_key: Vec<u8>,
}

impl SessionSigner {
    /// Create a signer with the given secret key.
    pub fn new(secret_key: impl AsRef<[u8]>) -> Self {
        Self {
            secret_key: secret_key.as_ref().to_vec(),
        }
    }

    /// Generate a fresh random session ID.
    pub fn generate_id() -> String {
        let mut bytes = [0u8; SESSION_ID_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Produce the cookie value for a session ID.
    pub fn sign(&self, session_id: &str) -> String {
        format!("{}.{}", session_id, hex::encode(self.compute_signature(session_id)))
    }

    /// Verify a token and return the session ID it carries.
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        let (session_id, signature) = token.split_once('.').ok_or(TokenError::Malformed)?;
        if session_id.len() != SESSION_ID_BYTES * 2 || hex::decode(session_id).is_err() {
            return Err(TokenError::Malformed);
        }

        let provided = hex::decode(signature).map_err(|_| TokenError::Malformed)?;
        let expected = self.compute_signature(session_id);

        if provided.ct_eq(&expected).into() {
            Ok(session_id.to_string())
        } else {
            Err(TokenError::InvalidSignature)
        }
    }

    fn compute_signature(&self, session_id: &str) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret_key).expect("HMAC can take key of any size");
        mac.update(session_id.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

impl std::fmt::Debug for SessionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSigner").finish_non_exhaustive()
    }
}
