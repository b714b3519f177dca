// src/config.rs
//! Process configuration for the identity core.
//!
//! Loaded from `IDENTITY_*` environment variables (with `.env` support
//! for local development). Consumers embedding this crate can also build
//! an [`IdentityConfig`] directly and hand it to the services.

use crate::error::{IdentityError, Result};
use crate::ledger::RetryPolicy;
use ::config::{Config, Environment};
use dotenv::dotenv;
use serde::Deserialize;
use std::time::Duration;

/// Placeholder encryption secret baked into the dev defaults. Anything
/// running with `production = true` must replace it.
pub const DEV_KEY_ENCRYPTION_SECRET: &str = "insecure-dev-secret";

/// Configuration inputs of the identity core.
///
/// # Environment Variables
/// - `IDENTITY_LEDGER_ENDPOINT`: resolver endpoint of the identity ledger
/// - `IDENTITY_MAX_CONNECT_RETRIES` / `IDENTITY_CONNECT_RETRY_DELAY_MS`:
///   connection retry budget and base backoff delay
/// - `IDENTITY_DID_CACHE_TTL_SECS`: DID cache TTL (default 3600)
/// - `IDENTITY_VERIFICATION_CACHE_TTL_SECS`: verification cache TTL
///   (unset = entries live until explicitly evicted)
/// - `IDENTITY_KEY_ENCRYPTION_SECRET`: secret protecting issuer key
///   material at rest
/// - `IDENTITY_PRODUCTION`: refuses placeholder secrets when true
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    pub ledger_endpoint: String,
    pub max_connect_retries: u32,
    pub connect_retry_delay_ms: u64,
    pub did_cache_ttl_secs: u64,
    pub verification_cache_ttl_secs: Option<u64>,
    pub key_encryption_secret: String,
    pub production: bool,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        IdentityConfig {
            ledger_endpoint: "http://127.0.0.1:8180".to_string(),
            max_connect_retries: 5,
            connect_retry_delay_ms: 250,
            did_cache_ttl_secs: 3600,
            verification_cache_ttl_secs: None,
            key_encryption_secret: DEV_KEY_ENCRYPTION_SECRET.to_string(),
            production: false,
        }
    }
}

impl IdentityConfig {
    /// Loads configuration from the environment on top of the dev
    /// defaults, then validates it.
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let defaults = IdentityConfig::default();
        let loaded: IdentityConfig = Config::builder()
            .set_default("ledger_endpoint", defaults.ledger_endpoint)
            .and_then(|b| b.set_default("max_connect_retries", defaults.max_connect_retries as i64))
            .and_then(|b| {
                b.set_default("connect_retry_delay_ms", defaults.connect_retry_delay_ms as i64)
            })
            .and_then(|b| b.set_default("did_cache_ttl_secs", defaults.did_cache_ttl_secs as i64))
            .and_then(|b| b.set_default("key_encryption_secret", defaults.key_encryption_secret))
            .and_then(|b| b.set_default("production", defaults.production))
            .map_err(|e| IdentityError::Configuration(e.to_string()))?
            .add_source(Environment::with_prefix("IDENTITY").try_parsing(true))
            .build()
            .map_err(|e| IdentityError::Configuration(e.to_string()))?
            .try_deserialize()
            .map_err(|e| IdentityError::Configuration(e.to_string()))?;

        loaded.validate()?;
        Ok(loaded)
    }

    /// Rejects configurations that must not reach production: a missing
    /// or placeholder key-encryption secret fails loudly rather than
    /// silently protecting issuer keys with a known value.
    pub fn validate(&self) -> Result<()> {
        if self.production
            && (self.key_encryption_secret.is_empty()
                || self.key_encryption_secret == DEV_KEY_ENCRYPTION_SECRET)
        {
            return Err(IdentityError::Configuration(
                "IDENTITY_KEY_ENCRYPTION_SECRET must be set to a non-default value in production"
                    .to_string(),
            ));
        }
        if self.ledger_endpoint.is_empty() {
            return Err(IdentityError::Configuration(
                "ledger endpoint must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn did_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.did_cache_ttl_secs)
    }

    pub fn verification_cache_ttl(&self) -> Option<Duration> {
        self.verification_cache_ttl_secs.map(Duration::from_secs)
    }

    /// The connection retry schedule for the ledger gateway.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_connect_retries,
            Duration::from_millis(self.connect_retry_delay_ms),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dev_defaults_validate() {
        IdentityConfig::default().validate().unwrap();
    }

    #[test]
    fn test_production_rejects_placeholder_secret() {
        let config = IdentityConfig {
            production: true,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(IdentityError::Configuration(_))
        ));
    }

    #[test]
    fn test_production_accepts_real_secret() {
        let config = IdentityConfig {
            production: true,
            key_encryption_secret: "k3yr1ng-rotation-2024".to_string(),
            ..Default::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn test_retry_policy_uses_configured_budget() {
        let config = IdentityConfig {
            max_connect_retries: 2,
            connect_retry_delay_ms: 10,
            ..Default::default()
        };
        // Smoke check that the policy is constructible from config values.
        let _ = config.retry_policy();
        assert_eq!(config.did_cache_ttl(), Duration::from_secs(3600));
        assert!(config.verification_cache_ttl().is_none());
    }
}
