//! Keyed digests for log correlation.
//!
//! Identifying values (email, mobile, government IDs) must never reach the
//! logs in cleartext. Log lines instead carry a short keyed SHA-256 digest of
//! a stable field, so operators can still correlate events for one subject
//! across lines without being able to read the value back.

use sha2::{Digest, Sha256};

const DIGEST_CHARS: usize = 16;

/// One-way keyed digest of `value`, hex-encoded and truncated.
pub fn log_digest(secret: &str, value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(b":");
    hasher.update(value.as_bytes());
    let mut hex = hex::encode(hasher.finalize());
    hex.truncate(DIGEST_CHARS);
    hex
}
