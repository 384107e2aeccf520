//! Keyed integrity hash over an event id and an identifier tuple.
//!
//! `hash = hex(HMAC-SHA256(secret, event_id || json(data)))`, where `json(data)` is the
//! compact serde_json rendering of the tuple. The same tuple always serializes to the
//! same bytes, so a hash computed at QR generation verifies at scan time.
use crate::table::Value;
use hmac::Hmac;
use hmac::Mac;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Error, Debug)]
pub enum SignerError {
    #[error("Secret key is empty")]
    EmptySecret,

    #[error("Invalid HMAC key: {0}")]
    InvalidKey(String),

    #[error("Failed to serialize identifier data: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Computes and checks integrity hashes with a process-wide secret.
#[derive(Clone)]
pub struct HashSigner {
    secret: Vec<u8>,
}

impl std::fmt::Debug for HashSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashSigner").field("secret", &"<redacted>").finish()
    }
}

impl HashSigner {
    /// Creates a signer; a blank secret is refused.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, SignerError> {
        let secret = secret.as_ref();
        if secret.iter().all(u8::is_ascii_whitespace) {
            return Err(SignerError::EmptySecret);
        }
        Ok(HashSigner { secret: secret.to_vec() })
    }

    fn digest(&self, event_id: &str, data: &[Value]) -> Result<Vec<u8>, SignerError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).map_err(|e| SignerError::InvalidKey(e.to_string()))?;
        mac.update(event_id.as_bytes());
        mac.update(&serde_json::to_vec(data)?);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    /// Lowercase hex HMAC-SHA256 of `event_id` followed by the JSON form of `data`.
    pub fn sign(&self, event_id: &str, data: &[Value]) -> Result<String, SignerError> {
        Ok(hex::encode(self.digest(event_id, data)?))
    }

    /// Recomputes the hash and compares it with `expected_hash` in constant time.
    /// Only the exact 64-character lowercase hex form verifies.
    pub fn verify(&self, event_id: &str, data: &[Value], expected_hash: &str) -> Result<bool, SignerError> {
        let actual = hex::encode(self.digest(event_id, data)?);
        Ok(bool::from(actual.as_bytes().ct_eq(expected_hash.as_bytes())))
    }
}
