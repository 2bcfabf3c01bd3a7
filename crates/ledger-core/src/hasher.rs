use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::Block;

/// Hex-encoded SHA-256 of `bytes`.
pub fn digest_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Compact JSON encoding of `value` with every object's keys sorted
/// lexicographically, at every nesting level.
pub fn canonical_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    Ok(sort_keys(serde_json::to_value(value)?).to_string())
}

/// Digest of the block's canonical JSON form.
pub fn hash_block(block: &Block) -> String {
    let encoded = canonical_json(block).expect("blocks only contain string-keyed JSON");
    digest_hex(encoded.as_bytes())
}

// serde_json keeps insertion order when its `preserve_order` feature is
// unified in, so the sort is done here rather than relied upon.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> =
                map.into_iter().map(|(k, v)| (k, sort_keys(v))).collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
