// src/storage/mod.rs
//! Identity store adapter.
//!
//! The relational persistence engine itself lives outside this crate;
//! everything here goes through the [`IdentityStore`] trait. Absence of a
//! record is `Ok(None)`, never an error. Upserts rely on the store's own
//! unique-key semantics (one DID record per `(subject_address, kind)`
//! pair) to resolve concurrent writers — there is no in-process locking
//! above the store.

pub mod memory;

use crate::error::Result;
use crate::models::credential::CredentialRecord;
use crate::models::did::{DidDocument, SubjectKind};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use memory::InMemoryStore;

/// A persisted DID document together with the encrypted key material that
/// accompanies issuer DIDs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StoredDid {
    pub document: DidDocument,
    /// AEAD-encrypted signing keys; present only for issuer subjects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_keys: Option<String>,
}

/// Field set accepted by [`IdentityStore::update_credential`]. Unset
/// fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct CredentialUpdate {
    pub holder_did: Option<String>,
    pub card_id: Option<String>,
    pub revoked: Option<bool>,
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Interface over the persistent store holding DID documents and
/// credential records.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Inserts or replaces the single DID record for
    /// `(subject_address, kind)`.
    async fn upsert_did(
        &self,
        subject_address: &str,
        kind: SubjectKind,
        document: &DidDocument,
        encrypted_keys: Option<&str>,
    ) -> Result<()>;

    /// Fetches the DID record for `(subject_address, kind)`.
    async fn get_did(&self, subject_address: &str, kind: SubjectKind)
        -> Result<Option<StoredDid>>;

    /// Persists a new credential record; returns its id.
    async fn insert_credential(&self, record: &CredentialRecord) -> Result<String>;

    /// Point lookup by credential id.
    async fn get_credential(&self, credential_id: &str) -> Result<Option<CredentialRecord>>;

    /// All credentials for a holder DID, most recent first.
    async fn get_credentials_by_holder(&self, holder_did: &str) -> Result<Vec<CredentialRecord>>;

    /// Looks up a credential by its claim-link nonce.
    async fn get_pending_credential(&self, claim_nonce: &str)
        -> Result<Option<CredentialRecord>>;

    /// Applies the set fields of `update` to an existing record. Updating
    /// an unknown id is a storage error.
    async fn update_credential(&self, credential_id: &str, update: CredentialUpdate)
        -> Result<()>;

    /// Whether any credential for the `(issuer, holder)` pair has been
    /// revoked.
    async fn get_revocation_status(&self, issuer_did: &str, holder_did: &str) -> Result<bool>;
}
