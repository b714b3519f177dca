// src/ledger/gateway.rs
//! Gateway to the distributed identity ledger.
//!
//! Holds the single logical connection the process keeps to the ledger
//! and resolves on-ledger DIDs through it. Connection establishment is
//! idempotent, serialised (no duplicate concurrent attempts) and retried
//! with exponential backoff; resolution auto-connects.

use crate::error::{IdentityError, Result};
use crate::ledger::retry::RetryPolicy;
use crate::models::did::DidDocument;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Transport seam between the gateway and a concrete ledger client.
///
/// Implementations own their endpoint configuration. `resolve` returns
/// `Ok(None)` when the ledger has no record for the DID; transport-level
/// failures are errors.
#[async_trait]
pub trait LedgerTransport: Send + Sync {
    /// Performs one connection attempt. Called again on reconnects; must
    /// be safe to invoke repeatedly.
    async fn connect(&self) -> Result<()>;

    /// Looks up a DID on the ledger. Requires a prior successful
    /// `connect`.
    async fn resolve(&self, did_uri: &str) -> Result<Option<DidDocument>>;
}

/// The process-wide ledger connection.
///
/// Concurrent `connect` callers serialise on the connection state: while
/// one attempt is in flight every other caller waits for it, and finds
/// the gateway connected once it succeeded. After the retry budget is
/// exhausted the operation fails with [`IdentityError::Connection`]
/// carrying the attempt count and last underlying error; the gateway
/// itself stays usable and a later call may connect.
pub struct LedgerGateway {
    transport: Arc<dyn LedgerTransport>,
    retry: RetryPolicy,
    connected: Mutex<bool>,
}

impl LedgerGateway {
    pub fn new(transport: Arc<dyn LedgerTransport>, retry: RetryPolicy) -> Self {
        LedgerGateway {
            transport,
            retry,
            connected: Mutex::new(false),
        }
    }

    /// Establishes the ledger connection if it is not already up.
    ///
    /// Returns immediately when connected; otherwise runs connection
    /// attempts under the retry policy while holding the state lock, so
    /// no second attempt can start concurrently.
    pub async fn connect(&self) -> Result<()> {
        let mut connected = self.connected.lock().await;
        if *connected {
            return Ok(());
        }

        let transport = Arc::clone(&self.transport);
        self.retry
            .run("ledger connect", || {
                let transport = Arc::clone(&transport);
                async move { transport.connect().await }
            })
            .await
            .map_err(|e| IdentityError::Connection {
                attempts: e.attempts,
                reason: e.last_error.to_string(),
            })?;

        *connected = true;
        log::info!("ledger connection established");
        Ok(())
    }

    /// Resolves a DID from the ledger, connecting first if necessary.
    ///
    /// `Ok(None)` means the ledger has no record for the DID — a normal
    /// outcome, not an error. Transport failures during resolution are
    /// reported to the caller and leave the connection state untouched.
    pub async fn resolve(&self, did_uri: &str) -> Result<Option<DidDocument>> {
        self.connect().await?;

        let resolved = self.transport.resolve(did_uri).await?;
        match &resolved {
            Some(doc) => log::debug!("resolved '{}' from ledger", doc.uri),
            None => log::debug!("no ledger record for '{}'", did_uri),
        }
        Ok(resolved)
    }

    /// Whether a connection has been established.
    pub async fn is_connected(&self) -> bool {
        *self.connected.lock().await
    }
}
