use serde_json::Value;
use sha2::{Digest, Sha256};

/// Fingerprints are truncated SHA-256 digests: 16 hex chars (64 bits) is
/// plenty for change detection at single-project file counts. Not a
/// security boundary.
const FINGERPRINT_LEN: usize = 16;

/// Short deterministic digest of a byte blob.
pub fn fingerprint_bytes(content: &[u8]) -> String {
    let digest = Sha256::digest(content);
    let mut hex = String::with_capacity(FINGERPRINT_LEN);
    for byte in digest.iter() {
        use std::fmt::Write as _;
        let _ = write!(hex, "{byte:02x}");
        if hex.len() >= FINGERPRINT_LEN {
            break;
        }
    }
    hex.truncate(FINGERPRINT_LEN);
    hex
}

/// Short deterministic digest of a structured document.
///
/// The document is canonicalized first (sorted keys at every mapping level)
/// so that two semantically identical specs with differently ordered keys
/// fingerprint identically — key order in user-authored JSON/YAML is not
/// meaningful.
pub fn fingerprint_document(doc: &Value) -> String {
    let mut canonical = String::new();
    write_canonical(doc, &mut canonical);
    fingerprint_bytes(canonical.as_bytes())
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => {
            // serde_json handles escaping; a String never fails to serialize.
            out.push_str(&serde_json::to_string(s).unwrap_or_default());
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key).unwrap_or_default());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
    }
}
