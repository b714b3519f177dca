// src/lib.rs

//! # Reputation Identity Core
//!
//! The decentralized-identifier (DID) and verifiable-credential layer of
//! the reputation platform. The UI, NFT contracts, and HTTP API consume
//! this crate; none of them appear here.
//!
//! ## Architecture Overview
//! 1. **Ledger Layer**: [`ledger::LedgerGateway`] holds the single
//!    connection to the identity ledger, with retrying connect and
//!    DID resolution
//! 2. **Services Layer**: DID lifecycle, claim schemas, and the
//!    claim → sign → verify → revoke credential pipeline
//! 3. **Storage Layer**: the [`storage::IdentityStore`] seam over the
//!    platform database, plus an in-memory backend
//! 4. **Wallet Layer**: secp256k1 signing keys and the envelope
//!    encryption protecting issuer keys at rest

// Module declarations (organized by functional domain)
pub mod cache; // generic TTL cache
pub mod config; // process configuration
pub mod error; // error types
pub mod ledger; // identity-ledger connectivity
pub mod models; // data structures
pub mod services; // business logic
pub mod storage; // persistence seam
pub mod utils; // helper functions
pub mod wallet; // cryptographic key operations

pub use config::IdentityConfig;
pub use error::{IdentityError, Result};
pub use ledger::{HttpLedgerTransport, LedgerGateway, LedgerTransport, RetryPolicy};
pub use models::credential::{
    Claim, ClaimerSignature, CredentialRecord, SignedCredential, VerificationResult,
};
pub use models::did::{DidDocument, ServiceEndpoint, SubjectKind, VerificationMethod};
pub use services::credential_service::CredentialService;
pub use services::did_manager::DidManager;
pub use services::schema_registry::{CTypeSchema, SchemaRegistry, REPUTATION_CARD_SCHEMA};
pub use storage::{CredentialUpdate, IdentityStore, InMemoryStore, StoredDid};
