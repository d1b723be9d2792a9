//! Schema fingerprinting (C1).
//!
//! A fingerprint is a stable 32-byte content hash of a schema's resolved,
//! canonical form. Two schemas with identical resolved structure must hash
//! identically regardless of how they were reached (inline, `$ref`, or
//! composition) so the cache in [`crate::cache`] can key on it.

use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;

/// 32-byte content hash of a resolved schema node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(pub [u8; 32]);

impl Fingerprint {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        let mut s = String::with_capacity(64);
        for b in &self.0 {
            s.push_str(&format!("{b:02x}"));
        }
        s
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Produce a canonical byte representation of a JSON value: object keys are
/// sorted so structurally-equal schemas with differently-ordered keys hash
/// identically.
fn canonicalize(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Null => out.push(b'n'),
        Value::Bool(b) => {
            out.push(b't');
            out.push(if *b { 1 } else { 0 });
        }
        Value::Number(n) => {
            out.push(b'#');
            out.extend_from_slice(n.to_string().as_bytes());
        }
        Value::String(s) => {
            out.push(b's');
            out.extend_from_slice(&(s.len() as u64).to_le_bytes());
            out.extend_from_slice(s.as_bytes());
        }
        Value::Array(items) => {
            out.push(b'[');
            for item in items {
                canonicalize(item, out);
            }
            out.push(b']');
        }
        Value::Object(map) => {
            out.push(b'{');
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for key in keys {
                out.push(b'k');
                out.extend_from_slice(&(key.len() as u64).to_le_bytes());
                out.extend_from_slice(key.as_bytes());
                // unwrap: key came from map.keys() above
                if let Some(v) = map.get(key) {
                    canonicalize(v, out);
                }
            }
            out.push(b'}');
        }
    }
}

/// Compute the fingerprint of a resolved schema value.
///
/// Callers MUST pass the already-`$ref`-resolved schema (see
/// [`crate::render::render_inline`]) so that two schemas reached via
/// different paths (inline vs. `$ref` vs. composition) with the same
/// resolved shape hash identically.
pub fn fingerprint_schema(resolved: &Value) -> Fingerprint {
    let mut bytes = Vec::with_capacity(256);
    canonicalize(resolved, &mut bytes);
    let digest = Sha256::digest(&bytes);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    Fingerprint(out)
}
