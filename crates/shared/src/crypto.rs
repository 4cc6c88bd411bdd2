//! Cryptographic utilities for opaque secret generation and hashing.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::Rng;
use sha2::{Digest, Sha256};

/// Number of characters kept as a display prefix of a secret.
pub const DISPLAY_PREFIX_LEN: usize = 8;

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generates an unguessable URL-safe secret with the given prefix.
///
/// `random_bytes` bytes are drawn from the thread-local CSPRNG and encoded
/// with unpadded URL-safe base64, so the result can be embedded in a URL or
/// a QR payload without escaping.
pub fn generate_secret(prefix: &str, random_bytes: usize) -> String {
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..random_bytes).map(|_| rng.gen()).collect();
    format!("{}{}", prefix, URL_SAFE_NO_PAD.encode(&bytes))
}

/// Returns the first characters of a secret for display and log correlation.
pub fn display_prefix(secret: &str) -> String {
    secret.chars().take(DISPLAY_PREFIX_LEN).collect()
}
