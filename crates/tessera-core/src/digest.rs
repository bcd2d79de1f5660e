//! Hashing primitives: canonical serialization, SHA-256, and the HMAC key.
//!
//! Digest input layout:
//!   - `event_hash`  = SHA-256(canonical(event))
//!   - `chain_hash`  = HMAC-SHA256(key, canonical(event) ‖ previous_hash)
//!
//! `previous_hash` contributes its 64 ASCII hex characters, not decoded bytes.
//! All digests are rendered as lowercase hex.

use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::{Digest, Sha256};

use tessera_contracts::{
    error::{TesseraError, TesseraResult},
    event::Event,
};

type HmacSha256 = Hmac<Sha256>;

/// Serialize `value` to its canonical byte form.
///
/// The value is first lowered to a `serde_json::Value` tree, whose object maps
/// keep keys sorted, then written as compact JSON. Two values that compare
/// equal always produce identical bytes regardless of map insertion order.
pub fn canonical_bytes<T: Serialize + ?Sized>(value: &T) -> TesseraResult<Vec<u8>> {
    let tree = serde_json::to_value(value).map_err(|e| TesseraError::Serialization {
        reason: format!("value is not canonicalizable: {}", e),
    })?;
    Ok(serde_json::to_vec(&tree)?)
}

/// SHA-256 of `bytes` as lowercase hex.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// SHA-256 of the canonical form of `event`; also the event's Merkle leaf.
pub fn event_digest(event: &Event) -> TesseraResult<String> {
    Ok(sha256_hex(&canonical_bytes(event)?))
}

/// The secret used to authenticate chain links.
///
/// Holding this key is enough to forge valid links, so it is injected at
/// construction, never serialized, and redacted from `Debug` output.
#[derive(Clone)]
pub struct ChainKey {
    mac: HmacSha256,
}

impl ChainKey {
    /// Build a key from raw secret bytes.
    ///
    /// Returns `TesseraError::ConfigError` when the secret is empty.
    pub fn new(secret: impl AsRef<[u8]>) -> TesseraResult<Self> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(TesseraError::ConfigError {
                reason: "HMAC secret key must not be empty".to_string(),
            });
        }
        let mac = HmacSha256::new_from_slice(secret).map_err(|e| TesseraError::ConfigError {
            reason: format!("invalid HMAC secret key: {}", e),
        })?;
        Ok(Self { mac })
    }

    /// HMAC-SHA256 over `canonical_event ‖ previous_hash`, as lowercase hex.
    pub fn chain_hash(&self, canonical_event: &[u8], previous_hash: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(canonical_event);
        mac.update(previous_hash.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

impl std::fmt::Debug for ChainKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ChainKey(<redacted>)")
    }
}
