// src/utils/crypto.rs
//! Cryptographic hashing utilities.
//!
//! Uses SHA-256 for all content hashing: schema identities, claim digests
//! for signing, and claim-link nonces.

use rand::RngCore;
use ring::digest;

/// Computes the SHA-256 hash of the input data.
///
/// # Arguments
/// * `data` - Binary data to hash (as bytes slice)
///
/// # Returns
/// Fixed-size 32-byte array (`[u8; 32]`) containing the hash.
pub fn hash_data(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(digest::digest(&digest::SHA256, data).as_ref());
    out
}

/// Computes the SHA-256 hash of the input and returns it as a
/// `0x`-prefixed lowercase hex string.
///
/// Used for content identities that travel between parties (schema
/// hashes), where a printable, copy-pastable form is needed.
pub fn hash_hex(data: &[u8]) -> String {
    format!("0x{}", hex::encode(hash_data(data)))
}

/// Generates a random claim-link nonce as a hex string.
///
/// Nonces key pending credentials until an unknown holder claims them;
/// 16 random bytes keep collisions out of reach for that population.
pub fn random_nonce() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(hash_data(b"hello"), hash_data(b"hello"));
        assert_ne!(hash_data(b"hello"), hash_data(b"world"));
    }

    #[test]
    fn test_hash_hex_format() {
        let h = hash_hex(b"hello");
        assert!(h.starts_with("0x"));
        assert_eq!(h.len(), 2 + 64);
    }

    #[test]
    fn test_nonces_are_unique() {
        assert_ne!(random_nonce(), random_nonce());
    }
}
