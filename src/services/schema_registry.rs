// src/services/schema_registry.rs
//! Claim schema (CType) registry.
//!
//! Defines the claim schemas the platform accepts, exposes each schema's
//! content-hash identity, and validates claim contents against the
//! schema's required-field set. The hash is computed over the canonical
//! JSON form of the definition, so the same schema always yields the same
//! hash — the property cross-party agreement on what was attested rests
//! on.

use crate::error::{IdentityError, Result};
use crate::utils::crypto::hash_hex;
use crate::utils::serialization::canonical_json;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Name of the built-in reputation-card schema.
pub const REPUTATION_CARD_SCHEMA: &str = "reputation-card";

/// A claim schema: which fields a claim of this type must carry.
///
/// `properties` records the declared value type per field; validation is
/// currently presence-only, the type map exists so a shape check can be
/// added behind the same API.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CTypeSchema {
    pub name: String,
    pub title: String,
    pub properties: BTreeMap<String, String>,
    pub required: Vec<String>,
}

/// The schema every issued reputation card conforms to.
static REPUTATION_CARD: Lazy<CTypeSchema> = Lazy::new(|| CTypeSchema {
    name: REPUTATION_CARD_SCHEMA.to_string(),
    title: "Reputation Card Credential".to_string(),
    properties: BTreeMap::from([
        ("template_id".to_string(), "string".to_string()),
        ("card_id".to_string(), "string".to_string()),
        ("tier".to_string(), "integer".to_string()),
        ("issue_date".to_string(), "string".to_string()),
        ("issuer_address".to_string(), "string".to_string()),
        ("holder_did".to_string(), "string".to_string()),
    ]),
    required: vec![
        "template_id".to_string(),
        "card_id".to_string(),
        "tier".to_string(),
        "issue_date".to_string(),
        "issuer_address".to_string(),
    ],
});

/// Registry of accepted claim schemas.
pub struct SchemaRegistry {
    schemas: HashMap<String, CTypeSchema>,
}

impl SchemaRegistry {
    /// Creates a registry pre-loaded with the platform's built-in
    /// reputation-card schema.
    pub fn new() -> Self {
        let mut registry = SchemaRegistry {
            schemas: HashMap::new(),
        };
        registry.register(REPUTATION_CARD.clone());
        registry
    }

    /// Adds (or replaces) a schema under its name.
    pub fn register(&mut self, schema: CTypeSchema) {
        self.schemas.insert(schema.name.clone(), schema);
    }

    pub fn get(&self, schema_name: &str) -> Option<&CTypeSchema> {
        self.schemas.get(schema_name)
    }

    /// Content-hash identity of a registered schema: SHA-256 over its
    /// canonical JSON definition, `0x`-prefixed hex.
    pub fn schema_hash(&self, schema_name: &str) -> Result<String> {
        let schema = self.require(schema_name)?;
        Ok(hash_hex(&canonical_json(schema)?))
    }

    /// Finds a registered schema by its content hash.
    pub fn schema_by_hash(&self, schema_hash: &str) -> Result<Option<&CTypeSchema>> {
        for schema in self.schemas.values() {
            if hash_hex(&canonical_json(schema)?) == schema_hash {
                return Ok(Some(schema));
            }
        }
        Ok(None)
    }

    /// True only if every field the schema marks required is present in
    /// `contents`. Value shapes are not checked.
    pub fn validate_claim_contents(
        &self,
        contents: &BTreeMap<String, Value>,
        schema_name: &str,
    ) -> Result<bool> {
        Ok(self.missing_fields(contents, schema_name)?.is_empty())
    }

    /// The schema-required fields absent from `contents`, for diagnostic
    /// error messages.
    pub fn missing_fields(
        &self,
        contents: &BTreeMap<String, Value>,
        schema_name: &str,
    ) -> Result<Vec<String>> {
        let schema = self.require(schema_name)?;
        Ok(schema
            .required
            .iter()
            .filter(|field| !contents.contains_key(*field))
            .cloned()
            .collect())
    }

    fn require(&self, schema_name: &str) -> Result<&CTypeSchema> {
        self.schemas.get(schema_name).ok_or_else(|| {
            IdentityError::Validation(format!("unknown claim schema '{}'", schema_name))
        })
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn card_contents() -> BTreeMap<String, Value> {
        BTreeMap::from([
            ("template_id".to_string(), json!("1")),
            ("card_id".to_string(), json!("42")),
            ("tier".to_string(), json!(1)),
            ("issue_date".to_string(), json!("2024-01-01")),
            ("issuer_address".to_string(), json!("0xabc")),
        ])
    }

    #[test]
    fn test_schema_hash_is_deterministic() {
        let a = SchemaRegistry::new();
        let b = SchemaRegistry::new();
        assert_eq!(
            a.schema_hash(REPUTATION_CARD_SCHEMA).unwrap(),
            b.schema_hash(REPUTATION_CARD_SCHEMA).unwrap()
        );
    }

    #[test]
    fn test_hash_changes_with_definition() {
        let mut registry = SchemaRegistry::new();
        let mut altered = registry.get(REPUTATION_CARD_SCHEMA).unwrap().clone();
        altered.name = "reputation-card-v2".to_string();
        altered.required.push("season".to_string());
        registry.register(altered);

        assert_ne!(
            registry.schema_hash(REPUTATION_CARD_SCHEMA).unwrap(),
            registry.schema_hash("reputation-card-v2").unwrap()
        );
    }

    #[test]
    fn test_lookup_by_hash() {
        let registry = SchemaRegistry::new();
        let hash = registry.schema_hash(REPUTATION_CARD_SCHEMA).unwrap();

        let found = registry.schema_by_hash(&hash).unwrap();
        assert_eq!(found.unwrap().name, REPUTATION_CARD_SCHEMA);
        assert!(registry.schema_by_hash("0xdeadbeef").unwrap().is_none());
    }

    #[test]
    fn test_complete_contents_validate() {
        let registry = SchemaRegistry::new();
        assert!(registry
            .validate_claim_contents(&card_contents(), REPUTATION_CARD_SCHEMA)
            .unwrap());
    }

    #[test]
    fn test_each_missing_required_field_fails() {
        let registry = SchemaRegistry::new();
        let complete = card_contents();

        for field in &registry.get(REPUTATION_CARD_SCHEMA).unwrap().required.clone() {
            let mut contents = complete.clone();
            contents.remove(field);
            assert!(
                !registry
                    .validate_claim_contents(&contents, REPUTATION_CARD_SCHEMA)
                    .unwrap(),
                "contents lacking '{}' must not validate",
                field
            );
            assert_eq!(
                registry
                    .missing_fields(&contents, REPUTATION_CARD_SCHEMA)
                    .unwrap(),
                vec![field.clone()]
            );
        }
    }

    #[test]
    fn test_optional_fields_are_not_required() {
        let registry = SchemaRegistry::new();
        // holder_did is declared but optional: absent is fine.
        assert!(registry
            .validate_claim_contents(&card_contents(), REPUTATION_CARD_SCHEMA)
            .unwrap());
    }

    #[test]
    fn test_unknown_schema_is_a_validation_error() {
        let registry = SchemaRegistry::new();
        assert!(matches!(
            registry.schema_hash("no-such-schema"),
            Err(IdentityError::Validation(_))
        ));
    }
}
