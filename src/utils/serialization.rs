// src/utils/serialization.rs
//! Serialization utilities for the identity core.
//!
//! Provides JSON helpers plus the canonical encoding used for everything
//! that gets hashed or signed (claims, schema definitions).

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Serializes a value to a JSON string.
pub fn serialize<T: Serialize>(data: &T) -> Result<String> {
    Ok(serde_json::to_string(data)?)
}

/// Deserializes a value from a JSON string.
///
/// The lifetime parameter allows the deserialized value to borrow from
/// the input string.
pub fn deserialize<'a, T: Deserialize<'a>>(data: &'a str) -> Result<T> {
    Ok(serde_json::from_str(data)?)
}

/// Encodes a value into canonical JSON bytes.
///
/// The value is first converted to a `serde_json::Value`; object keys end
/// up in a `Map` backed by a BTreeMap (this crate does not enable
/// serde_json's `preserve_order` feature), so the emitted bytes are
/// byte-identical for semantically equal inputs. Signatures and content
/// hashes are computed over this form so that independently constructed
/// copies of the same claim or schema agree.
pub fn canonical_json<T: Serialize>(data: &T) -> Result<Vec<u8>> {
    let value = serde_json::to_value(data)?;
    Ok(serde_json::to_vec(&value)?)
}
