// src/models/credential.rs
//! Claim and Verifiable Credential data model.
//!
//! A [`Claim`] is the unsigned assertion an issuer makes about a subject;
//! a [`SignedCredential`] is that claim plus cryptographic proof; a
//! [`CredentialRecord`] is the stored, addressable form the platform
//! persists and later verifies or revokes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Field name inside claim contents that carries the holder's DID, when
/// the holder is known at issuance time.
pub const HOLDER_DID_FIELD: &str = "holder_did";

/// The unsigned assertion an issuer makes about a subject.
///
/// # Invariant
/// `contents` must contain every field the schema referenced by
/// `schema_hash` marks as required; the schema registry enforces this at
/// construction time.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Claim {
    /// Content-hash identity of the schema this claim conforms to
    pub schema_hash: String,

    /// Issuer DID URI that will sign the claim
    pub owner: String,

    /// Claim field values. A BTreeMap keeps the serialized form
    /// deterministic, which the claim signature depends on.
    pub contents: BTreeMap<String, Value>,
}

impl Claim {
    /// The holder DID recorded in the claim contents, or `""` when the
    /// claim was issued before its holder was known.
    pub fn holder_did(&self) -> String {
        self.contents
            .get(HOLDER_DID_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }
}

/// Signature proof attached to a claim.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ClaimerSignature {
    /// Base64-encoded compact ECDSA signature (64 bytes: R || S)
    pub signature: String,

    /// URI of the verification method that produced the signature.
    /// Must reference a method in the issuer document's assertion or
    /// authentication set.
    pub key_uri: String,
}

/// A claim plus its cryptographic proof.
///
/// Both fields are optional at the type level because credentials arrive
/// from untrusted input: verification reports a missing claim or proof as
/// a structural error in the [`VerificationResult`] rather than failing
/// to deserialize.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SignedCredential {
    #[serde(default)]
    pub claim: Option<Claim>,

    #[serde(default)]
    pub claimer_signature: Option<ClaimerSignature>,
}

impl SignedCredential {
    pub fn new(claim: Claim, claimer_signature: ClaimerSignature) -> Self {
        SignedCredential {
            claim: Some(claim),
            claimer_signature: Some(claimer_signature),
        }
    }
}

/// The persisted, addressable form of a credential.
///
/// Created either complete (holder known at issuance) or pending
/// (`holder_did` empty, keyed by `claim_nonce`, `card_id` unset). A
/// pending record transitions exactly once to complete. Records are never
/// deleted; revocation flips `revoked` permanently and stamps
/// `revoked_at`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CredentialRecord {
    /// Unique opaque identifier assigned at storage time
    pub credential_id: String,

    /// Holder DID URI; empty string while the credential is pending
    pub holder_did: String,

    /// Issuer DID URI (the claim's owner)
    pub issuer_did: String,

    /// Content-hash identity of the claim's schema
    pub schema_hash: String,

    /// The claim field values as issued
    pub claim_contents: BTreeMap<String, Value>,

    /// The claim signature proof
    pub signature: ClaimerSignature,

    /// Optional on-ledger anchor reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attestation_id: Option<String>,

    /// Subject card this credential attests; unset while pending
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_id: Option<String>,

    /// Card template the credential was issued from
    pub template_id: String,

    /// Claim-link nonce for the pending flow; unset for credentials
    /// issued complete
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_nonce: Option<String>,

    /// Permanent once true; there is no un-revoke
    pub revoked: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl CredentialRecord {
    /// Whether this record is still awaiting its holder.
    pub fn is_pending(&self) -> bool {
        self.holder_did.is_empty()
    }

    /// Reassembles the signed credential from the persisted fields, for
    /// re-verification of a stored record.
    pub fn to_signed_credential(&self) -> SignedCredential {
        SignedCredential::new(
            Claim {
                schema_hash: self.schema_hash.clone(),
                owner: self.issuer_did.clone(),
                contents: self.claim_contents.clone(),
            },
            self.signature.clone(),
        )
    }
}

/// Outcome of verifying a [`SignedCredential`].
///
/// Not persisted; cached transiently keyed by credential id. Structural
/// and signature problems land in `errors`, revocation in `warnings` plus
/// the `revoked` flag, and `valid` summarises both.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    /// True only if there are no errors and the credential is not revoked
    pub valid: bool,

    pub issuer_did: String,
    pub holder_did: String,
    pub revoked: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}
