//! Deterministic short identifiers for source positions and rendered elements.
//!
//! A fingerprint is the first 12 hex characters of the SHA-256 digest of the
//! canonical JSON form of its input: object keys sorted recursively, arrays
//! kept in order, no insignificant whitespace. This is byte-for-byte the
//! output of `JSON.stringify` over a key-sorted object, so ids agree with the
//! ones minted in the browser for the same signature.
//!
//! 12 hex characters carry 48 bits. Collisions are possible in principle and
//! are not detected.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};

/// Number of hex characters kept from the digest.
pub const FINGERPRINT_LEN: usize = 12;

/// Recursively sort every object's keys; arrays keep their order but their
/// elements are normalised too. Scalars (including `null`) pass through.
pub fn normalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), normalize(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(normalize).collect()),
        other => other.clone(),
    }
}

/// Hash arbitrary structured input into a 12-character fingerprint.
pub fn fingerprint(data: &Value) -> String {
    let canonical = canonical_json(&normalize(data));
    let digest = Sha256::digest(canonical.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    hex[..FINGERPRINT_LEN].to_owned()
}

/// Fingerprint of a static source position: `{filePath, line, column}`.
///
/// `line` is 1-based and `column` 0-based, the convention used for every
/// position stored in the graph.
pub fn positional_fingerprint(file_path: &str, line: usize, column: usize) -> String {
    fingerprint(&json!({
        "filePath": file_path,
        "line": line,
        "column": column,
    }))
}

/// Structural signature of a rendered element, used when no static position
/// is available (matching a live element against the static graph).
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSignature {
    pub tag_name: String,
    /// The subset of attributes that identify the element (id, class, ...).
    pub attributes: Option<BTreeMap<String, String>>,
    /// Ancestor chain such as `body>div#root>main`.
    pub ancestor_path: Option<String>,
    /// Index among siblings with the same tag.
    pub sibling_index: Option<usize>,
}

pub fn structural_fingerprint(signature: &ElementSignature) -> String {
    // Serializing a plain struct of strings, maps and integers cannot fail.
    let value = serde_json::to_value(signature).unwrap_or(Value::Null);
    fingerprint(&value)
}

/// Compact JSON with keys in the order they were inserted. `normalize` has
/// already sorted them, so this does not depend on serde_json's map backend.
fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let body: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}:{}", Value::String(k.clone()), canonical_json(v)))
                .collect();
            format!("{{{}}}", body.join(","))
        }
        Value::Array(items) => {
            let body: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", body.join(","))
        }
        scalar => scalar.to_string(),
    }
}
