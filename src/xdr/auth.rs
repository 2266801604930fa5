//! Request signing for the advanced XDR API key scheme.
//!
//! Every request carries a timestamp, the per-process nonce and a SHA-256
//! digest over `api_key || nonce || timestamp`, hex-encoded lowercase.

use chrono::Utc;
use data_encoding::BASE32;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Number of random bytes mixed into the per-process nonce.
const NONCE_BYTES: usize = 40;

/// Generates the per-process nonce: 40 CSPRNG bytes, base32-encoded.
pub(super) fn generate_nonce() -> String {
    let mut bytes = [0u8; NONCE_BYTES];
    OsRng.fill_bytes(&mut bytes);
    BASE32.encode(&bytes)
}

/// Computes the `Authorization` value for one request.
///
/// `hash_prefix` is the fixed `api_key || nonce` concatenation derived at
/// client construction.
pub(super) fn api_key_hash(hash_prefix: &str, ts_millis: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(hash_prefix.as_bytes());
    hasher.update(ts_millis.as_bytes());
    hex::encode(hasher.finalize())
}

/// Current time in milliseconds since the epoch as a decimal string.
pub(super) fn timestamp_millis() -> String {
    Utc::now().timestamp_millis().to_string()
}
