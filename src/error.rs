// src/error.rs
//! Error types for the identity and credential core.
//!
//! Absence of a record (DID or credential) is never an error in this crate:
//! lookups return `Ok(None)` and callers decide what a miss means. The
//! variants below cover the failures that must surface to the caller.

use thiserror::Error;

/// Errors produced by the DID / credential core.
#[derive(Error, Debug)]
pub enum IdentityError {
    /// Ledger unreachable after the retry budget was exhausted.
    /// Fatal to the calling operation, not to the process.
    #[error("ledger connection failed after {attempts} attempt(s): {reason}")]
    Connection { attempts: u32, reason: String },

    /// Transport-level failure while talking to the ledger (after a
    /// connection was established). Reported to the caller, never swallowed.
    #[error("ledger transport error: {0}")]
    Ledger(String),

    /// Malformed claim or credential: missing required fields, missing
    /// signing key. Never retried.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Persistence layer failure. Propagated as-is, not retried here.
    #[error("storage error: {0}")]
    Storage(String),

    /// Issuer key material could not be encrypted (RNG or cipher setup
    /// failure).
    #[error("key encryption failed: {0}")]
    Encryption(String),

    /// Issuer key material could not be decrypted with the presented key.
    /// Fails closed: no partial plaintext is ever returned.
    #[error("key decryption failed: wrong encryption key or corrupted key material")]
    Decryption,

    /// Signature creation or key handling failed.
    #[error("signature error: {0}")]
    Signature(String),

    /// JSON (de)serialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid or missing process configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, IdentityError>;

impl From<serde_json::Error> for IdentityError {
    fn from(err: serde_json::Error) -> Self {
        IdentityError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for IdentityError {
    fn from(err: reqwest::Error) -> Self {
        IdentityError::Ledger(err.to_string())
    }
}

impl IdentityError {
    /// Whether the operation that produced this error may be retried.
    /// Validation and decryption failures are deterministic and never are.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            IdentityError::Connection { .. } | IdentityError::Ledger(_)
        )
    }
}
