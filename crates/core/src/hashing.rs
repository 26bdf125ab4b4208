//! SHA-256 hashing helpers.
//!
//! Content hashes are computed over canonical JSON (object keys sorted
//! recursively) so that semantically equal documents hash equally
//! regardless of field order in the source file.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::CoreError;

/// Compute the SHA-256 digest of a byte slice as lowercase hex.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Compute a `sha256:<hex>` content hash over a value's canonical JSON.
pub fn content_hash<T: Serialize>(value: &T) -> Result<String, CoreError> {
    let json = serde_json::to_value(value)
        .map_err(|e| CoreError::Internal(format!("content hash serialization failed: {e}")))?;
    let canonical = canonical_json(&json);
    Ok(format!("sha256:{}", sha256_hex(canonical.as_bytes())))
}

/// Serialize a JSON value with object keys sorted at every level.
pub fn canonical_json(value: &serde_json::Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &serde_json::Value, out: &mut String) {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (index, key) in keys.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&map[*key], out);
            }
            out.push('}');
        }
        serde_json::Value::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        other => out.push_str(&other.to_string()),
    }
}
