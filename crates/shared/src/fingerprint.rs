//! Payload fingerprinting for log and audit lines.
//!
//! Raw QR payloads carry personal identifiers, so log lines reference them
//! by a short SHA-256 prefix instead of the payload text.

use sha2::{Digest, Sha256};

/// Length of the hex prefix used in logs.
const FINGERPRINT_LEN: usize = 12;

/// Computes a short, stable fingerprint of a scanned payload.
pub fn payload_fingerprint(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..FINGERPRINT_LEN].to_string()
}
