// src/models/did.rs
//! Decentralized Identifier (DID) data model.
//!
//! Defines the structure for DID Documents following the
//! [DID Core Specification](https://www.w3.org/TR/did-core/): a subject
//! identifier plus the verification material needed to prove control of
//! it and to check assertions made with it.

use crate::error::{IdentityError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// URI prefix of light (off-ledger) DIDs. The method-specific id embeds
/// the subject kind and wallet address (`did:light:<kind>:<address>`),
/// so light DIDs resolve from the store without a ledger and a dual-role
/// address gets distinct holder and issuer identities.
pub const LIGHT_DID_PREFIX: &str = "did:light:";

/// A single verification method inside a DID Document.
///
/// # DID Format
/// The `id` field is the method URI: the document's DID plus a fragment,
/// e.g. `did:light:0xabc#key-0`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VerificationMethod {
    /// Method URI, unique within the document
    pub id: String,

    /// Key type identifier
    /// Example: "EcdsaSecp256k1VerificationKey2019"
    #[serde(rename = "type")]
    pub key_type: String,

    /// DID of the entity controlling this key
    pub controller: String,

    /// Hex-encoded public key material (SEC1 compressed point for
    /// secp256k1 keys)
    pub public_key_hex: String,
}

/// A service endpoint advertised by a DID subject.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoint {
    pub id: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub endpoint: String,
}

/// A DID Document representing a decentralized identity.
///
/// Contains the cryptographic material necessary to authenticate the DID
/// subject (`authentication`), to check claims it issues
/// (`assertion_method`), and to establish encrypted channels with it
/// (`key_agreement`).
///
/// # Invariants
/// - `authentication` is non-empty
/// - a verification-method `id` always denotes one key: two different
///   methods never share an id (re-listing one method under several
///   relationships is fine)
///
/// Documents are immutable once created: key rotation is expressed by
/// superseding the DID with a new one, never by editing in place.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DidDocument {
    /// The complete DID string identifier
    /// Example: "did:light:issuer:0x91f3a2"
    pub uri: String,

    /// Verification methods proving control of the DID
    pub authentication: Vec<VerificationMethod>,

    /// Verification methods used when issuing claims
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assertion_method: Vec<VerificationMethod>,

    /// Verification methods for encrypted key exchange
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_agreement: Vec<VerificationMethod>,

    /// Service endpoints for interacting with the subject
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service: Vec<ServiceEndpoint>,
}

impl DidDocument {
    /// Builds a light (off-ledger) DID document for a subject address from
    /// freshly generated secp256k1 key material.
    ///
    /// The single key is referenced from both `authentication` and
    /// `assertion_method` under the `#key-0` fragment, so the document can
    /// both prove control and back claim signatures.
    pub fn new_light(subject_address: &str, kind: SubjectKind, public_key_hex: &str) -> Self {
        let uri = format!("{}{}:{}", LIGHT_DID_PREFIX, kind, subject_address);
        let method = VerificationMethod {
            id: format!("{}#key-0", uri),
            key_type: "EcdsaSecp256k1VerificationKey2019".to_string(),
            controller: uri.clone(),
            public_key_hex: public_key_hex.to_string(),
        };
        DidDocument {
            uri,
            authentication: vec![method.clone()],
            assertion_method: vec![method],
            key_agreement: Vec::new(),
            service: Vec::new(),
        }
    }

    /// Checks the document invariants: non-empty `authentication`, and no
    /// two distinct verification methods sharing an id. Re-listing the
    /// same method under several relationships (as light documents do for
    /// authentication and assertion) is allowed.
    pub fn validate(&self) -> Result<()> {
        if self.authentication.is_empty() {
            return Err(IdentityError::Validation(format!(
                "DID document '{}' has no authentication methods",
                self.uri
            )));
        }
        let mut seen: HashMap<&str, &VerificationMethod> = HashMap::new();
        for method in self.verification_methods() {
            if let Some(existing) = seen.insert(method.id.as_str(), method) {
                if existing != method {
                    return Err(IdentityError::Validation(format!(
                        "verification method id '{}' is used by two different keys in DID document '{}'",
                        method.id, self.uri
                    )));
                }
            }
        }
        Ok(())
    }

    /// Iterates over every verification method in the document.
    pub fn verification_methods(&self) -> impl Iterator<Item = &VerificationMethod> {
        self.authentication
            .iter()
            .chain(self.assertion_method.iter())
            .chain(self.key_agreement.iter())
    }

    /// Looks up a verification method by its full URI, searching
    /// `assertion_method` first and `authentication` second — the sets a
    /// claim signature is allowed to reference.
    pub fn find_signing_method(&self, key_uri: &str) -> Option<&VerificationMethod> {
        self.assertion_method
            .iter()
            .chain(self.authentication.iter())
            .find(|m| m.id == key_uri)
    }
}

/// The two kinds of subjects the platform manages identities for.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    /// A user receiving credentials
    Holder,
    /// An entity issuing and signing credentials; carries encrypted key
    /// material alongside its document
    Issuer,
}

impl SubjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectKind::Holder => "holder",
            SubjectKind::Issuer => "issuer",
        }
    }

    /// Parses the kind tag embedded in light DID uris.
    pub fn from_tag(tag: &str) -> Option<SubjectKind> {
        match tag {
            "holder" => Some(SubjectKind::Holder),
            "issuer" => Some(SubjectKind::Issuer),
            _ => None,
        }
    }
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
