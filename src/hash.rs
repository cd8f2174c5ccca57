//! Canonical content hashing of schema fragments.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Hash a schema fragment independently of key order.
///
/// The fragment is written in a canonical form (object keys sorted at
/// every depth, no insignificant whitespace) and digested with SHA-256.
/// Array order is significant.
pub fn schema_hash(schema: &Map<String, Value>) -> String {
    let mut canonical = String::new();
    write_canonical_object(schema, &mut canonical);

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => write_canonical_object(map, out),
        Value::Array(arr) => {
            out.push('[');
            for (i, item) in arr.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        // Scalars already have a single serialized form
        other => out.push_str(&other.to_string()),
    }
}

fn write_canonical_object(map: &Map<String, Value>, out: &mut String) {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    out.push('{');
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&Value::String(key.clone()).to_string());
        out.push(':');
        write_canonical(value, out);
    }
    out.push('}');
}
