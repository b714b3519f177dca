// src/services/credential_service.rs
//! Credential pipeline: claim construction, signing, persistence,
//! verification, and revocation.
//!
//! A claim validated against the schema registry is signed into a
//! [`SignedCredential`] with the issuer's first authentication key, then
//! persisted either complete (holder known) or pending (claim-link flow,
//! keyed by nonce). Verification checks structure, revocation status,
//! the signature against the resolved issuer document, and schema-hash
//! presence; its result is cached per credential id and evicted again on
//! revocation.

use crate::cache::TtlCache;
use crate::config::IdentityConfig;
use crate::error::{IdentityError, Result};
use crate::models::credential::{
    Claim, ClaimerSignature, CredentialRecord, SignedCredential, VerificationResult,
};
use crate::models::did::DidDocument;
use crate::services::did_manager::DidManager;
use crate::services::schema_registry::SchemaRegistry;
use crate::storage::{CredentialUpdate, IdentityStore};
use crate::utils::serialization::canonical_json;
use crate::wallet::key_management::KeyManager;
use chrono::Utc;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// End-to-end credential service.
///
/// Construction/signing failures are typed errors; verification instead
/// reports problems inside the returned [`VerificationResult`], so
/// callers get the full diagnostic list rather than the first exception.
pub struct CredentialService {
    store: Arc<dyn IdentityStore>,
    did_manager: Arc<DidManager>,
    schemas: Arc<SchemaRegistry>,
    verification_cache: TtlCache<String, VerificationResult>,
}

impl CredentialService {
    pub fn new(
        store: Arc<dyn IdentityStore>,
        did_manager: Arc<DidManager>,
        schemas: Arc<SchemaRegistry>,
        config: &IdentityConfig,
    ) -> Self {
        let verification_cache = match config.verification_cache_ttl() {
            Some(ttl) => TtlCache::new(ttl),
            None => TtlCache::unbounded(),
        };
        CredentialService {
            store,
            did_manager,
            schemas,
            verification_cache,
        }
    }

    /// Builds a claim owned by `issuer_did` after validating it against
    /// the schema identified by `schema_hash`.
    ///
    /// # Errors
    /// [`IdentityError::Validation`] when the schema hash is unknown or
    /// any schema-required field is missing from `contents`.
    pub fn create_credential(
        &self,
        schema_hash: &str,
        contents: BTreeMap<String, Value>,
        issuer_did: &DidDocument,
    ) -> Result<Claim> {
        let schema = self
            .schemas
            .schema_by_hash(schema_hash)?
            .ok_or_else(|| {
                IdentityError::Validation(format!("unknown schema hash '{}'", schema_hash))
            })?;

        let missing = self.schemas.missing_fields(&contents, &schema.name)?;
        if !missing.is_empty() {
            return Err(IdentityError::Validation(format!(
                "claim is missing required field(s): {}",
                missing.join(", ")
            )));
        }

        Ok(Claim {
            schema_hash: schema_hash.to_string(),
            owner: issuer_did.uri.clone(),
            contents,
        })
    }

    /// Signs a claim into a verifiable credential.
    ///
    /// The issuer's first `authentication` key signs the canonical claim
    /// encoding; the attached proof references that key's URI so any
    /// party holding the resolved issuer document can verify it.
    ///
    /// # Errors
    /// [`IdentityError::Validation`] when the issuer document has no
    /// authentication key.
    pub fn sign_credential(
        &self,
        claim: &Claim,
        issuer_did: &DidDocument,
        keys: &KeyManager,
    ) -> Result<SignedCredential> {
        let signing_method = issuer_did.authentication.first().ok_or_else(|| {
            IdentityError::Validation(format!(
                "issuer DID '{}' has no authentication key to sign with",
                issuer_did.uri
            ))
        })?;

        let payload = canonical_json(claim)?;
        let signature = keys.sign(&payload)?;

        log::debug!(
            "signed claim for schema {} with key '{}'",
            claim.schema_hash,
            signing_method.id
        );
        Ok(SignedCredential::new(
            claim.clone(),
            ClaimerSignature {
                signature,
                key_uri: signing_method.id.clone(),
            },
        ))
    }

    /// Verifies a signed credential.
    ///
    /// With a `credential_id`, a cached result is returned immediately
    /// and a freshly computed one is cached under that id. The pipeline:
    /// structural check, revocation lookup for the `(issuer, holder)`
    /// pair, signature validation against the resolved issuer document,
    /// schema-hash presence. `valid` is true only with no errors and no
    /// revocation.
    ///
    /// Storage and ledger-connection failures propagate as errors; every
    /// problem with the credential itself lands in the result.
    pub async fn verify_credential(
        &self,
        credential: &SignedCredential,
        credential_id: Option<&str>,
    ) -> Result<VerificationResult> {
        if let Some(id) = credential_id {
            if let Some(cached) = self.verification_cache.get(&id.to_string()) {
                log::debug!("verification cache hit for credential '{}'", id);
                return Ok(cached);
            }
        }

        let result = self.run_verification(credential).await?;

        if let Some(id) = credential_id {
            self.verification_cache
                .insert(id.to_string(), result.clone());
        }
        Ok(result)
    }

    async fn run_verification(
        &self,
        credential: &SignedCredential,
    ) -> Result<VerificationResult> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let (claim, proof) = match (&credential.claim, &credential.claimer_signature) {
            (Some(claim), Some(proof)) => (claim, proof),
            (claim, proof) => {
                if claim.is_none() {
                    errors.push("credential has no claim".to_string());
                }
                if proof.is_none() {
                    errors.push("credential has no signature proof".to_string());
                }
                return Ok(VerificationResult {
                    valid: false,
                    issuer_did: String::new(),
                    holder_did: String::new(),
                    revoked: false,
                    errors,
                    warnings,
                });
            }
        };

        let issuer_did = claim.owner.clone();
        let holder_did = claim.holder_did();

        let revoked = self
            .store
            .get_revocation_status(&issuer_did, &holder_did)
            .await?;
        if revoked {
            warnings.push("credential has been revoked by its issuer".to_string());
        }

        match self.did_manager.resolve(&issuer_did).await? {
            None => errors.push(format!("issuer DID '{}' could not be resolved", issuer_did)),
            Some(document) => match document.find_signing_method(&proof.key_uri) {
                None => errors.push(format!(
                    "signing key '{}' is not present in the issuer document",
                    proof.key_uri
                )),
                Some(method) => {
                    let payload = canonical_json(claim)?;
                    match KeyManager::verify(&method.public_key_hex, &payload, &proof.signature) {
                        Ok(true) => {}
                        Ok(false) => errors
                            .push("claim signature does not verify against the issuer key".into()),
                        Err(e) => errors.push(format!("malformed signature material: {}", e)),
                    }
                }
            },
        }

        if claim.schema_hash.is_empty() {
            errors.push("claim carries no schema hash".to_string());
        }

        Ok(VerificationResult {
            valid: errors.is_empty() && !revoked,
            issuer_did,
            holder_did,
            revoked,
            errors,
            warnings,
        })
    }

    /// Persists a complete credential linked to an issued card. Returns
    /// the freshly assigned credential id.
    pub async fn store_credential(
        &self,
        credential: &SignedCredential,
        card_id: &str,
        template_id: &str,
    ) -> Result<String> {
        let record = self.build_record(credential, template_id)?;
        let record = CredentialRecord {
            card_id: Some(card_id.to_string()),
            ..record
        };
        let id = self.store.insert_credential(&record).await?;
        log::info!(
            "stored credential '{}' for holder '{}' (card {})",
            id,
            record.holder_did,
            card_id
        );
        Ok(id)
    }

    /// Persists a pending credential for an as-yet-unknown holder, keyed
    /// by `claim_nonce` for later claim-link redemption.
    pub async fn store_pending_credential(
        &self,
        credential: &SignedCredential,
        template_id: &str,
        claim_nonce: &str,
    ) -> Result<String> {
        let record = self.build_record(credential, template_id)?;
        let record = CredentialRecord {
            holder_did: String::new(),
            card_id: None,
            claim_nonce: Some(claim_nonce.to_string()),
            ..record
        };
        let id = self.store.insert_credential(&record).await?;
        log::info!("stored pending credential '{}' under nonce {}", id, claim_nonce);
        Ok(id)
    }

    fn build_record(
        &self,
        credential: &SignedCredential,
        template_id: &str,
    ) -> Result<CredentialRecord> {
        let claim = credential.claim.as_ref().ok_or_else(|| {
            IdentityError::Validation("cannot store a credential without a claim".into())
        })?;
        let signature = credential.claimer_signature.as_ref().ok_or_else(|| {
            IdentityError::Validation("cannot store an unsigned credential".into())
        })?;

        Ok(CredentialRecord {
            credential_id: uuid::Uuid::new_v4().to_string(),
            holder_did: claim.holder_did(),
            issuer_did: claim.owner.clone(),
            schema_hash: claim.schema_hash.clone(),
            claim_contents: claim.contents.clone(),
            signature: signature.clone(),
            attestation_id: None,
            card_id: None,
            template_id: template_id.to_string(),
            claim_nonce: None,
            revoked: false,
            revoked_at: None,
            created_at: Utc::now(),
        })
    }

    /// Looks up a pending credential by its claim-link nonce.
    pub async fn get_pending_credential_by_nonce(
        &self,
        claim_nonce: &str,
    ) -> Result<Option<CredentialRecord>> {
        self.store.get_pending_credential(claim_nonce).await
    }

    /// Completes a pending credential with its claimed holder and card.
    ///
    /// Completion is a strict one-time transition: a record whose holder
    /// is already set rejects a second completion instead of silently
    /// overwriting it.
    pub async fn update_pending_credential(
        &self,
        credential_id: &str,
        holder_did: &str,
        card_id: &str,
    ) -> Result<()> {
        let record = self
            .store
            .get_credential(credential_id)
            .await?
            .ok_or_else(|| {
                IdentityError::Storage(format!("credential '{}' not found", credential_id))
            })?;

        if !record.is_pending() {
            return Err(IdentityError::Validation(format!(
                "credential '{}' has already been claimed by '{}'",
                credential_id, record.holder_did
            )));
        }

        self.store
            .update_credential(
                credential_id,
                CredentialUpdate {
                    holder_did: Some(holder_did.to_string()),
                    card_id: Some(card_id.to_string()),
                    ..Default::default()
                },
            )
            .await?;
        log::info!(
            "pending credential '{}' claimed by '{}' (card {})",
            credential_id,
            holder_did,
            card_id
        );
        Ok(())
    }

    /// All credentials held by `holder_did`, most recent first.
    pub async fn get_credentials_by_holder(
        &self,
        holder_did: &str,
    ) -> Result<Vec<CredentialRecord>> {
        self.store.get_credentials_by_holder(holder_did).await
    }

    /// Point lookup; `Ok(None)` when the id is unknown.
    pub async fn get_credential_by_id(
        &self,
        credential_id: &str,
    ) -> Result<Option<CredentialRecord>> {
        self.store.get_credential(credential_id).await
    }

    /// Permanently revokes a credential.
    ///
    /// The record is flagged and timestamped, never deleted, and there is
    /// no way back. The credential's verification-cache entry is evicted
    /// so a previously cached `valid` result cannot outlive the
    /// revocation.
    pub async fn revoke_credential(&self, credential_id: &str) -> Result<()> {
        self.store
            .update_credential(
                credential_id,
                CredentialUpdate {
                    revoked: Some(true),
                    revoked_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await?;
        self.verification_cache.evict(&credential_id.to_string());
        log::info!("revoked credential '{}'", credential_id);
        Ok(())
    }
}
