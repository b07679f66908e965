//! Canonical JSON form used for checksumming
//!
//! Two semantically identical artifacts must hash identically regardless of
//! key insertion order, and an artifact must hash identically with or without
//! its own `checksum` attached. The canonical form therefore:
//!
//! - sorts object keys recursively,
//! - removes the top-level `checksum` key of an object, or of every record in
//!   a sequence,
//! - drops sequence elements that consist of nothing but a `checksum` key
//!   (the trailing sentinel of a published document).

use crate::checksum::{Checksum, ChecksumError};
use serde::Serialize;
use serde_json::{Map, Value};

/// Name of the embedded checksum field
pub const CHECKSUM_FIELD: &str = "checksum";

/// Compute the checksum of any serializable artifact content
///
/// # Errors
/// Returns [`ChecksumError::Malformed`] if the value cannot be represented as
/// JSON (for example a map with non-string keys).
pub fn checksum<T>(content: &T) -> Result<Checksum, ChecksumError>
where
    T: Serialize + ?Sized,
{
    let bytes = canonical_bytes(content)?;
    Ok(Checksum::digest(&bytes))
}

/// Compact canonical serialization, checksum field excluded
///
/// # Errors
/// Same as [`checksum`].
pub fn canonical_bytes<T>(content: &T) -> Result<Vec<u8>, ChecksumError>
where
    T: Serialize + ?Sized,
{
    let value = serde_json::to_value(content)?;
    let canonical = canonicalize(&exclude_checksum(&value));
    Ok(serde_json::to_vec(&canonical)?)
}

/// Remove the top-level checksum from an object or from each record of a sequence
#[must_use]
pub fn exclude_checksum(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(without_checksum(map)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .filter(|item| !is_sentinel(item))
                .map(|item| match item {
                    Value::Object(map) => Value::Object(without_checksum(map)),
                    other => other.clone(),
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Whether `value` is a bare `{"checksum": ...}` record
#[must_use]
pub fn is_sentinel(value: &Value) -> bool {
    matches!(value, Value::Object(map) if map.len() == 1 && map.contains_key(CHECKSUM_FIELD))
}

/// Recursively sort object keys
///
/// Rebuilds every map in key order so the result serializes the same way
/// whether or not `serde_json` preserves insertion order.
#[must_use]
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            let sorted: Map<String, Value> = entries
                .into_iter()
                .map(|(k, v)| (k.clone(), canonicalize(v)))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

fn without_checksum(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .filter(|(k, _)| k.as_str() != CHECKSUM_FIELD)
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
