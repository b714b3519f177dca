// src/ledger/http.rs
//! HTTP resolver transport for the identity ledger.
//!
//! Talks to a universal-resolver-style HTTP endpoint: `GET /health` for
//! connectivity, `GET /1.0/identifiers/{did}` for resolution. A 404 from
//! the resolver means the ledger has no record for the DID and maps to
//! `Ok(None)`.

use crate::error::{IdentityError, Result};
use crate::ledger::gateway::LedgerTransport;
use crate::models::did::DidDocument;
use async_trait::async_trait;
use reqwest::StatusCode;

/// Ledger transport over a resolver HTTP API.
#[derive(Clone)]
pub struct HttpLedgerTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLedgerTransport {
    /// # Arguments
    /// * `base_url` - Resolver endpoint, e.g. `https://resolver.example.org`
    pub fn new(base_url: &str) -> Self {
        HttpLedgerTransport {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl LedgerTransport for HttpLedgerTransport {
    async fn connect(&self) -> Result<()> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(IdentityError::Ledger(format!(
                "resolver health check returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn resolve(&self, did_uri: &str) -> Result<Option<DidDocument>> {
        let url = format!("{}/1.0/identifiers/{}", self.base_url, did_uri);
        let response = self.client.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(IdentityError::Ledger(format!(
                "resolver returned {} for '{}'",
                response.status(),
                did_uri
            )));
        }

        let document: DidDocument = response.json().await?;
        document.validate()?;
        Ok(Some(document))
    }
}
