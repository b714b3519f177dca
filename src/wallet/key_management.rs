// src/wallet/key_management.rs
//! Cryptographic key management for DID subjects.
//!
//! Provides generation, (de)serialization, and usage of the secp256k1
//! keypairs behind light DIDs:
//! - ECDSA signatures over SHA-256 content hashes
//! - SEC1 public key export for DID documents
//! - secret export/import for the encrypted-at-rest issuer round trip
//!
//! Uses the `k256` crate; signatures are 64-byte compact (R || S) and
//! travel base64-encoded.

use crate::error::{IdentityError, Result};
use crate::utils::crypto::hash_data;
use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::{PublicKey, SecretKey};

/// A secp256k1 keypair.
///
/// # Security Notes
/// - The secret key is never exposed except through
///   [`KeyManager::export_secret_hex`], which exists solely to feed the
///   issuer key-encryption path
/// - Signing uses deterministic ECDSA (RFC 6979)
#[derive(Clone)]
pub struct KeyManager {
    /// Securely held private key
    secret_key: SecretKey,
    /// Derived public key for verification
    pub public_key: PublicKey,
}

impl KeyManager {
    /// Generates a fresh keypair from the system RNG.
    pub fn generate() -> Self {
        let secret_key = SecretKey::random(&mut rand::thread_rng());
        let public_key = secret_key.public_key();
        KeyManager {
            secret_key,
            public_key,
        }
    }

    /// Reconstructs a keypair from a hex-encoded secret key, as produced
    /// by [`KeyManager::export_secret_hex`].
    pub fn from_secret_hex(secret_hex: &str) -> Result<Self> {
        let bytes = hex::decode(secret_hex)
            .map_err(|e| IdentityError::Signature(format!("invalid secret key hex: {}", e)))?;
        let secret_key = SecretKey::from_slice(&bytes)
            .map_err(|e| IdentityError::Signature(format!("invalid secret key: {}", e)))?;
        let public_key = secret_key.public_key();
        Ok(KeyManager {
            secret_key,
            public_key,
        })
    }

    /// Hex-encoded secret key. Only ever persisted inside an encrypted
    /// blob (see `wallet::key_encryption`).
    pub fn export_secret_hex(&self) -> String {
        hex::encode(self.secret_key.to_bytes())
    }

    /// Hex-encoded SEC1 compressed public key, as embedded in DID
    /// document verification methods.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.to_encoded_point(true).as_bytes())
    }

    /// Signs a message: SHA-256 content hash, then ECDSA over the
    /// prehash.
    ///
    /// # Returns
    /// Base64-encoded 64-byte compact signature (R || S).
    pub fn sign(&self, message: &[u8]) -> Result<String> {
        let hash = hash_data(message);
        let signing_key = SigningKey::from(&self.secret_key);
        let signature: Signature = signing_key
            .sign_prehash(&hash)
            .map_err(|e| IdentityError::Signature(format!("signing failed: {}", e)))?;
        Ok(base64::encode(signature.to_vec()))
    }

    /// Verifies a signature produced by [`KeyManager::sign`] against a
    /// hex-encoded SEC1 public key.
    ///
    /// # Returns
    /// - `Ok(true)` / `Ok(false)` for a well-formed signature that does /
    ///   does not match
    /// - `Err` when the key or signature bytes themselves are malformed
    pub fn verify(public_key_hex: &str, message: &[u8], signature_b64: &str) -> Result<bool> {
        let key_bytes = hex::decode(public_key_hex)
            .map_err(|e| IdentityError::Signature(format!("invalid public key hex: {}", e)))?;
        let verifying_key = VerifyingKey::from_sec1_bytes(&key_bytes)
            .map_err(|e| IdentityError::Signature(format!("invalid public key: {}", e)))?;

        let signature_bytes = base64::decode(signature_b64)
            .map_err(|e| IdentityError::Signature(format!("invalid signature encoding: {}", e)))?;
        let signature = Signature::from_slice(&signature_bytes)
            .map_err(|e| IdentityError::Signature(format!("invalid signature: {}", e)))?;

        let hash = hash_data(message);
        Ok(verifying_key.verify_prehash(&hash, &signature).is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify_round_trip() {
        let keys = KeyManager::generate();
        let signature = keys.sign(b"attested contents").unwrap();

        assert!(
            KeyManager::verify(&keys.public_key_hex(), b"attested contents", &signature).unwrap()
        );
        assert!(!KeyManager::verify(&keys.public_key_hex(), b"tampered", &signature).unwrap());
    }

    #[test]
    fn test_signature_from_other_key_rejected() {
        let keys = KeyManager::generate();
        let other = KeyManager::generate();
        let signature = keys.sign(b"msg").unwrap();

        assert!(!KeyManager::verify(&other.public_key_hex(), b"msg", &signature).unwrap());
    }

    #[test]
    fn test_secret_export_import_round_trip() {
        let keys = KeyManager::generate();
        let restored = KeyManager::from_secret_hex(&keys.export_secret_hex()).unwrap();

        assert_eq!(keys.public_key_hex(), restored.public_key_hex());

        // The restored key signs verifiably under the original public key.
        let signature = restored.sign(b"msg").unwrap();
        assert!(KeyManager::verify(&keys.public_key_hex(), b"msg", &signature).unwrap());
    }

    #[test]
    fn test_malformed_inputs_are_errors() {
        assert!(KeyManager::from_secret_hex("zz").is_err());
        assert!(KeyManager::verify("not-hex", b"msg", "sig").is_err());

        let keys = KeyManager::generate();
        assert!(KeyManager::verify(&keys.public_key_hex(), b"msg", "!!!not-base64").is_err());
    }
}
