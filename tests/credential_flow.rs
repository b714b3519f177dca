// tests/credential_flow.rs
//! End-to-end credential scenarios over an in-memory store and a stub
//! ledger transport: card issuance with later revocation, and the
//! claim-link flow for credentials issued before their holder is known.

use anyhow::Result;
use async_trait::async_trait;
use reputation_identity::utils::crypto::random_nonce;
use reputation_identity::{
    CredentialService, DidDocument, DidManager, IdentityConfig, InMemoryStore, LedgerGateway,
    LedgerTransport, RetryPolicy, SchemaRegistry, SignedCredential, SubjectKind,
    REPUTATION_CARD_SCHEMA,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

struct NullTransport;

#[async_trait]
impl LedgerTransport for NullTransport {
    async fn connect(&self) -> reputation_identity::Result<()> {
        Ok(())
    }

    async fn resolve(
        &self,
        _did_uri: &str,
    ) -> reputation_identity::Result<Option<DidDocument>> {
        Ok(None)
    }
}

struct Platform {
    did_manager: Arc<DidManager>,
    schemas: Arc<SchemaRegistry>,
    credentials: CredentialService,
}

fn platform() -> Platform {
    let _ = env_logger::builder().is_test(true).try_init();

    let config = IdentityConfig::default();
    let store = Arc::new(InMemoryStore::new());
    let gateway = Arc::new(LedgerGateway::new(
        Arc::new(NullTransport),
        RetryPolicy::new(1, Duration::from_millis(1)),
    ));
    let did_manager = Arc::new(DidManager::new(store.clone(), gateway, &config));
    let schemas = Arc::new(SchemaRegistry::new());
    let credentials =
        CredentialService::new(store, did_manager.clone(), schemas.clone(), &config);
    Platform {
        did_manager,
        schemas,
        credentials,
    }
}

fn card_contents(holder_did: Option<&str>) -> BTreeMap<String, Value> {
    let mut contents = BTreeMap::from([
        ("template_id".to_string(), json!("1")),
        ("card_id".to_string(), json!("42")),
        ("tier".to_string(), json!(1)),
        ("issue_date".to_string(), json!("2024-01-01")),
        ("issuer_address".to_string(), json!("0xabc")),
    ]);
    if let Some(holder) = holder_did {
        contents.insert("holder_did".to_string(), json!(holder));
    }
    contents
}

async fn issue_card(
    p: &Platform,
    issuer_address: &str,
    holder_did: Option<&str>,
) -> Result<SignedCredential> {
    let issuer = p
        .did_manager
        .generate_did(issuer_address, SubjectKind::Issuer)
        .await?;
    let (_, keys) = p
        .did_manager
        .issuer_signing_keys(issuer_address)
        .await?
        .expect("issuer was just created");

    let schema_hash = p.schemas.schema_hash(REPUTATION_CARD_SCHEMA)?;
    let claim =
        p.credentials
            .create_credential(&schema_hash, card_contents(holder_did), &issuer)?;
    Ok(p.credentials.sign_credential(&claim, &issuer, &keys)?)
}

#[tokio::test]
async fn card_issuance_revocation_scenario() -> Result<()> {
    let p = platform();

    // Holder registers first; the issuer signs a card naming them.
    let holder = p
        .did_manager
        .generate_did("0xholder", SubjectKind::Holder)
        .await?;
    let signed = issue_card(&p, "0xissuer1", Some(&holder.uri)).await?;

    let id = p.credentials.store_credential(&signed, "42", "1").await?;

    let record = p
        .credentials
        .get_credential_by_id(&id)
        .await?
        .expect("stored record");
    assert!(!record.revoked);
    assert_eq!(record.card_id.as_deref(), Some("42"));
    assert_eq!(record.template_id, "1");
    assert_eq!(record.holder_did, holder.uri);

    // Holder's wall shows the new card first.
    let wall = p.credentials.get_credentials_by_holder(&holder.uri).await?;
    assert_eq!(wall.len(), 1);
    assert_eq!(wall[0].credential_id, id);

    let verdict = p.credentials.verify_credential(&signed, Some(id.as_str())).await?;
    assert!(verdict.valid, "freshly issued card must verify: {:?}", verdict.errors);

    p.credentials.revoke_credential(&id).await?;

    // The same signed payload now fails verification, including when the
    // stored record is re-checked from scratch.
    let verdict = p.credentials.verify_credential(&signed, Some(id.as_str())).await?;
    assert!(!verdict.valid);
    assert!(verdict.revoked);

    let reloaded = p
        .credentials
        .get_credential_by_id(&id)
        .await?
        .expect("revoked records are kept");
    let verdict = p
        .credentials
        .verify_credential(&reloaded.to_signed_credential(), None)
        .await?;
    assert!(!verdict.valid && verdict.revoked);
    Ok(())
}

#[tokio::test]
async fn pending_claim_link_scenario() -> Result<()> {
    let p = platform();

    // Issued before any holder is known.
    let signed = issue_card(&p, "0xissuer1", None).await?;
    let nonce = random_nonce();
    let id = p
        .credentials
        .store_pending_credential(&signed, "5", &nonce)
        .await?;

    let pending = p
        .credentials
        .get_pending_credential_by_nonce(&nonce)
        .await?
        .expect("pending record reachable through its nonce");
    assert_eq!(pending.credential_id, id);
    assert_eq!(pending.holder_did, "");
    assert!(pending.card_id.is_none());

    // A holder redeems the claim link.
    let holder = p
        .did_manager
        .generate_did("0xholder9", SubjectKind::Holder)
        .await?;
    p.credentials
        .update_pending_credential(&id, &holder.uri, "card77")
        .await?;

    let claimed = p
        .credentials
        .get_credential_by_id(&id)
        .await?
        .expect("claimed record");
    assert_eq!(claimed.holder_did, holder.uri);
    assert_eq!(claimed.card_id.as_deref(), Some("card77"));

    // The claim link is single-use.
    assert!(p
        .credentials
        .update_pending_credential(&id, "did:light:0xsomeone", "card99")
        .await
        .is_err());
    Ok(())
}

#[tokio::test]
async fn issuer_identity_is_stable_across_cards() -> Result<()> {
    let p = platform();

    let first = issue_card(&p, "0xissuer1", None).await?;
    let second = issue_card(&p, "0xissuer1", None).await?;

    let first_claim = first.claim.expect("signed claim");
    let second_claim = second.claim.expect("signed claim");
    assert_eq!(
        first_claim.owner, second_claim.owner,
        "repeat issuance must reuse the issuer DID"
    );

    // Both cards verify concurrently against the shared issuer identity.
    let a = SignedCredential::new(first_claim, first.claimer_signature.unwrap());
    let b = SignedCredential::new(second_claim, second.claimer_signature.unwrap());
    let results = futures::future::join_all(vec![
        p.credentials.verify_credential(&a, None),
        p.credentials.verify_credential(&b, None),
    ])
    .await;
    for result in results {
        assert!(result?.valid);
    }
    Ok(())
}
