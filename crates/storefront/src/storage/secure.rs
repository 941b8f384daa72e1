//! Obfuscated, TTL-bearing envelope over a [`StorageBackend`].
//!
//! Writes encrypt-then-encode: the JSON envelope `{data, created_at,
//! expires_at, version}` is XOR-obfuscated with a keystream derived from the
//! configured key, then base64-encoded. Reads decode-then-decrypt and enforce
//! expiry at the application layer.
//!
//! This is obfuscation, NOT a security boundary: a determined local attacker
//! can recover the plaintext. The goal is keeping the cart session id out of
//! casual inspection of the persisted store, nothing more.
//!
//! Reads fail closed and self-heal: an undecodable, version-mismatched, or
//! expired record is treated as absent and eagerly purged, along with any
//! legacy record stored under the bare (unprefixed) key, so stale blobs never
//! accumulate.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::StorageBackend;

/// Current envelope format version. Records with any other version are
/// purged on read.
const ENVELOPE_VERSION: u32 = 2;

/// Prefix distinguishing enveloped records from legacy plain ones.
const KEY_PREFIX: &str = "secure_";

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    data: String,
    created_at: i64,
    expires_at: i64,
    version: u32,
}

/// TTL-enforcing obfuscated wrapper around a key-value backend.
#[derive(Debug, Clone)]
pub struct SecureStore<B> {
    backend: B,
    key: Vec<u8>,
}

impl<B: StorageBackend> SecureStore<B> {
    /// Create a store obfuscating with a keystream derived from
    /// `obfuscation_key`. The key is deployment configuration, not a secret
    /// in the cryptographic sense.
    #[must_use]
    pub fn new(backend: B, obfuscation_key: &str) -> Self {
        Self {
            backend,
            key: derive_keystream(obfuscation_key),
        }
    }

    /// Store `value` under `key`, expiring after `ttl`.
    pub async fn set_item(&self, key: &str, value: &str, ttl: Duration) {
        let now = Utc::now().timestamp_millis();
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let envelope = Envelope {
            data: value.to_string(),
            created_at: now,
            expires_at: now.saturating_add(ttl_ms),
            version: ENVELOPE_VERSION,
        };
        // Envelope is plain data; serialization cannot fail.
        let plaintext = serde_json::to_string(&envelope).unwrap_or_default();
        let encoded = BASE64.encode(xor_keystream(plaintext.as_bytes(), &self.key));
        self.backend
            .write(&format!("{KEY_PREFIX}{key}"), encoded)
            .await;
    }

    /// Read the value stored under `key`.
    ///
    /// Returns `None` - purging the record - when it is missing, cannot be
    /// decoded or decrypted, carries an unknown envelope version, or is past
    /// its expiry.
    pub async fn get_item(&self, key: &str) -> Option<String> {
        let storage_key = format!("{KEY_PREFIX}{key}");
        let Some(encoded) = self.backend.read(&storage_key).await else {
            // Migration: a record under the bare key predates the envelope
            // format and is unreadable now; purge it.
            if self.backend.read(key).await.is_some() {
                debug!(key, "purging legacy unencrypted record");
                self.backend.delete(key).await;
            }
            return None;
        };

        match self.decode(&encoded) {
            Some(envelope) if envelope.expires_at > Utc::now().timestamp_millis() => {
                Some(envelope.data)
            }
            Some(_) => {
                debug!(key, "purging expired record");
                self.remove_item(key).await;
                None
            }
            None => {
                debug!(key, "purging undecodable record");
                self.remove_item(key).await;
                None
            }
        }
    }

    /// Delete the record under `key`, including any legacy-format record.
    pub async fn remove_item(&self, key: &str) {
        self.backend.delete(&format!("{KEY_PREFIX}{key}")).await;
        self.backend.delete(key).await;
    }

    fn decode(&self, encoded: &str) -> Option<Envelope> {
        let ciphertext = BASE64.decode(encoded).ok()?;
        let plaintext = xor_keystream(&ciphertext, &self.key);
        let envelope: Envelope = serde_json::from_slice(&plaintext).ok()?;
        (envelope.version == ENVELOPE_VERSION).then_some(envelope)
    }
}

/// Expand a key string into keystream bytes. FNV-1a over the key seeds the
/// stream so short keys still cycle over 64 distinct bytes.
fn derive_keystream(key: &str) -> Vec<u8> {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut state = FNV_OFFSET;
    for byte in key.bytes() {
        state ^= u64::from(byte);
        state = state.wrapping_mul(FNV_PRIME);
    }

    let mut stream = Vec::with_capacity(64);
    for _ in 0..8 {
        state = state.wrapping_mul(FNV_PRIME).wrapping_add(1);
        stream.extend_from_slice(&state.to_le_bytes());
    }
    stream
}

/// XOR data against the cycled keystream. Symmetric: applying it twice
/// restores the input.
fn xor_keystream(data: &[u8], key: &[u8]) -> Vec<u8> {
    data.iter()
        .zip(key.iter().cycle())
        .map(|(d, k)| d ^ k)
        .collect()
}
