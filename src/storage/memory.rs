// src/storage/memory.rs
//! In-memory identity store.
//!
//! Backs tests and local development; production deployments plug their
//! own [`IdentityStore`] implementation over the platform database. The
//! maps live behind mutexes so the store can be shared across tasks.

use crate::error::{IdentityError, Result};
use crate::models::credential::CredentialRecord;
use crate::models::did::{DidDocument, SubjectKind};
use crate::storage::{CredentialUpdate, IdentityStore, StoredDid};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Hash-map backed store with the same unique-key semantics a relational
/// backend would enforce.
#[derive(Default)]
pub struct InMemoryStore {
    dids: Mutex<HashMap<(String, SubjectKind), StoredDid>>,
    credentials: Mutex<HashMap<String, CredentialRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of credential records held (pending and complete).
    pub fn credential_count(&self) -> usize {
        self.credentials.lock().expect("store mutex poisoned").len()
    }
}

#[async_trait]
impl IdentityStore for InMemoryStore {
    async fn upsert_did(
        &self,
        subject_address: &str,
        kind: SubjectKind,
        document: &DidDocument,
        encrypted_keys: Option<&str>,
    ) -> Result<()> {
        let mut dids = self.dids.lock().expect("store mutex poisoned");
        dids.insert(
            (subject_address.to_string(), kind),
            StoredDid {
                document: document.clone(),
                encrypted_keys: encrypted_keys.map(str::to_string),
            },
        );
        Ok(())
    }

    async fn get_did(
        &self,
        subject_address: &str,
        kind: SubjectKind,
    ) -> Result<Option<StoredDid>> {
        let dids = self.dids.lock().expect("store mutex poisoned");
        Ok(dids.get(&(subject_address.to_string(), kind)).cloned())
    }

    async fn insert_credential(&self, record: &CredentialRecord) -> Result<String> {
        let mut credentials = self.credentials.lock().expect("store mutex poisoned");
        credentials.insert(record.credential_id.clone(), record.clone());
        Ok(record.credential_id.clone())
    }

    async fn get_credential(&self, credential_id: &str) -> Result<Option<CredentialRecord>> {
        let credentials = self.credentials.lock().expect("store mutex poisoned");
        Ok(credentials.get(credential_id).cloned())
    }

    async fn get_credentials_by_holder(&self, holder_did: &str) -> Result<Vec<CredentialRecord>> {
        let credentials = self.credentials.lock().expect("store mutex poisoned");
        let mut records: Vec<CredentialRecord> = credentials
            .values()
            .filter(|r| r.holder_did == holder_did)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn get_pending_credential(
        &self,
        claim_nonce: &str,
    ) -> Result<Option<CredentialRecord>> {
        let credentials = self.credentials.lock().expect("store mutex poisoned");
        Ok(credentials
            .values()
            .find(|r| r.claim_nonce.as_deref() == Some(claim_nonce))
            .cloned())
    }

    async fn update_credential(
        &self,
        credential_id: &str,
        update: CredentialUpdate,
    ) -> Result<()> {
        let mut credentials = self.credentials.lock().expect("store mutex poisoned");
        let record = credentials.get_mut(credential_id).ok_or_else(|| {
            IdentityError::Storage(format!("credential '{}' not found", credential_id))
        })?;

        if let Some(holder_did) = update.holder_did {
            record.holder_did = holder_did;
        }
        if let Some(card_id) = update.card_id {
            record.card_id = Some(card_id);
        }
        if let Some(revoked) = update.revoked {
            record.revoked = revoked;
        }
        if let Some(revoked_at) = update.revoked_at {
            record.revoked_at = Some(revoked_at);
        }
        Ok(())
    }

    async fn get_revocation_status(&self, issuer_did: &str, holder_did: &str) -> Result<bool> {
        let credentials = self.credentials.lock().expect("store mutex poisoned");
        Ok(credentials
            .values()
            .any(|r| r.issuer_did == issuer_did && r.holder_did == holder_did && r.revoked))
    }
}
