// src/wallet/key_encryption.rs
//! Envelope encryption for issuer key material at rest.
//!
//! Issuer signing keys are persisted alongside their DID documents and
//! must never touch the store in the clear. The scheme here:
//! - a 256-bit AES-GCM key derived from the configured encryption secret
//!   via PBKDF2-HMAC-SHA256 with a fresh random salt
//! - AEAD sealing with a fresh random 96-bit nonce
//! - blob layout `salt || nonce || ciphertext+tag`, base64-encoded
//!
//! Decryption with any secret other than the one used to encrypt fails
//! closed with [`IdentityError::Decryption`].

use crate::error::{IdentityError, Result};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use std::num::NonZeroU32;

const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;
const PBKDF2_ITERATIONS: u32 = 100_000;

fn derive_key(secret: &str, salt: &[u8]) -> [u8; KEY_LEN] {
    let iterations = NonZeroU32::new(PBKDF2_ITERATIONS).expect("iteration count is non-zero");
    let mut key = [0u8; KEY_LEN];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        salt,
        secret.as_bytes(),
        &mut key,
    );
    key
}

/// Encrypts key material under the configured encryption secret.
///
/// # Returns
/// Base64 blob containing salt, nonce, and ciphertext; safe to persist.
pub fn encrypt_keys(plaintext: &[u8], encryption_secret: &str) -> Result<String> {
    let rng = SystemRandom::new();

    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt)
        .map_err(|_| IdentityError::Encryption("salt generation failed".into()))?;
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rng.fill(&mut nonce_bytes)
        .map_err(|_| IdentityError::Encryption("nonce generation failed".into()))?;

    let key = derive_key(encryption_secret, &salt);
    let sealing_key = LessSafeKey::new(
        UnboundKey::new(&AES_256_GCM, &key)
            .map_err(|_| IdentityError::Encryption("cipher setup failed".into()))?,
    );

    let mut in_out = plaintext.to_vec();
    sealing_key
        .seal_in_place_append_tag(
            Nonce::assume_unique_for_key(nonce_bytes),
            Aad::empty(),
            &mut in_out,
        )
        .map_err(|_| IdentityError::Encryption("sealing failed".into()))?;

    let mut blob = Vec::with_capacity(SALT_LEN + NONCE_LEN + in_out.len());
    blob.extend_from_slice(&salt);
    blob.extend_from_slice(&nonce_bytes);
    blob.extend_from_slice(&in_out);
    Ok(base64::encode(blob))
}

/// Decrypts a blob produced by [`encrypt_keys`].
///
/// # Errors
/// [`IdentityError::Decryption`] when the blob is malformed or the
/// presented secret does not match the one used to encrypt. No partial
/// plaintext is ever returned.
pub fn decrypt_keys(blob_b64: &str, encryption_secret: &str) -> Result<Vec<u8>> {
    let blob = base64::decode(blob_b64).map_err(|_| IdentityError::Decryption)?;
    if blob.len() < SALT_LEN + NONCE_LEN + AES_256_GCM.tag_len() {
        return Err(IdentityError::Decryption);
    }

    let (salt, rest) = blob.split_at(SALT_LEN);
    let (nonce_bytes, ciphertext) = rest.split_at(NONCE_LEN);

    let key = derive_key(encryption_secret, salt);
    let opening_key = LessSafeKey::new(
        UnboundKey::new(&AES_256_GCM, &key).map_err(|_| IdentityError::Decryption)?,
    );

    let nonce =
        Nonce::try_assume_unique_for_key(nonce_bytes).map_err(|_| IdentityError::Decryption)?;
    let mut in_out = ciphertext.to_vec();
    let plaintext = opening_key
        .open_in_place(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| IdentityError::Decryption)?;

    Ok(plaintext.to_vec())
}
