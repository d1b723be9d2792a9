//! Body decoder and transformer (C4).
//!
//! Reads a request/response body exactly once, republishes it on the
//! message so downstream consumers see the identical bytes (spec invariant
//! 4), resolves `Content-Type` against an operation's declared `content`
//! map, and decodes the captured bytes into the polymorphic JSON-like tree
//! C5 evaluates. XML and URL-encoded transformation are external
//! collaborators (section 1 out-of-scope list); this module only defines
//! the seam ([`BodyTransformer`]) and calls into it when one is registered.

use crate::http::BodyCell;
use std::collections::HashMap;
use std::io::Read;
use std::sync::{Arc, Mutex};

/// Read a body's bytes exactly once. If the cell is already `Buffered`
/// (either because a previous validation pass already read it, or because
/// the caller constructed the message from an in-memory buffer), returns a
/// clone of the same `Arc` without touching the reader again — this is
/// what makes repeated calls across request+response validation, or across
/// parameter `content` validation and body validation, idempotent.
pub fn read_body(cell: &Mutex<BodyCell>) -> std::io::Result<Arc<[u8]>> {
    // unwrap: a panicked holder would poison every subsequent validation on
    // this message; the cache discipline elsewhere in this crate treats a
    // poisoned lock as unrecoverable rather than silently losing data.
    let mut guard = cell.lock().unwrap_or_else(|e| e.into_inner());
    match &*guard {
        BodyCell::Buffered(bytes) => Ok(Arc::clone(bytes)),
        BodyCell::Unread(_) => {
            let BodyCell::Unread(mut reader) =
                std::mem::replace(&mut *guard, BodyCell::Buffered(Arc::from(Vec::new().into_boxed_slice())))
            else {
                unreachable!("just matched Unread above")
            };
            let mut buf = Vec::new();
            reader.read_to_end(&mut buf)?;
            let bytes: Arc<[u8]> = Arc::from(buf.into_boxed_slice());
            *guard = BodyCell::Buffered(Arc::clone(&bytes));
            Ok(bytes)
        }
    }
}

/// Parse a `Content-Type` header's primary value, dropping parameters like
/// `charset` (spec section 4.4: content-type resolution). Returns `None`
/// for an empty/absent header.
pub fn parse_media_type(content_type: &str) -> Option<&str> {
    let primary = content_type.split(';').next()?.trim();
    if primary.is_empty() {
        None
    } else {
        Some(primary)
    }
}

fn media_range_matches(pattern: &str, actual_type: &str, actual_subtype: &str) -> bool {
    let Some((p_type, p_subtype)) = pattern.split_once('/') else {
        return false;
    };
    (p_type == "*" || p_type == actual_type) && (p_subtype == "*" || p_subtype == actual_subtype)
}

/// Match a resolved media type against an operation's `content` map: exact
/// match first, then media-range wildcard matching (`type/*`, `*/subtype`,
/// `*/*`). Returns the matched key from `content_keys` so the caller can use
/// it to look up the corresponding schema.
pub fn match_content_type<'a>(content_keys: impl Iterator<Item = &'a str>, media_type: &str) -> Option<&'a str> {
    let keys: Vec<&str> = content_keys.collect();
    if let Some(exact) = keys.iter().find(|k| **k == media_type) {
        return Some(exact);
    }
    let Some((actual_type, actual_subtype)) = media_type.split_once('/') else {
        return None;
    };
    keys.into_iter().find(|k| media_range_matches(k, actual_type, actual_subtype))
}

/// A collaborator that turns a non-JSON body into the JSON-equivalent value
/// tree the schema describes (section 1: XML/URL-encoded decoders are
/// external collaborators; section 4.4: pluggable decoders).
pub trait BodyTransformer: Send + Sync {
    fn transform(&self, bytes: &[u8]) -> Result<serde_json::Value, String>;
}

/// Registry of transformers keyed by exact media type (e.g.
/// `application/xml`, `application/x-www-form-urlencoded`).
#[derive(Clone, Default)]
pub struct BodyTransformers {
    by_media_type: HashMap<String, Arc<dyn BodyTransformer>>,
}

impl BodyTransformers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, media_type: impl Into<String>, transformer: Arc<dyn BodyTransformer>) {
        self.by_media_type.insert(media_type.into(), transformer);
    }

    fn get(&self, media_type: &str) -> Option<&Arc<dyn BodyTransformer>> {
        self.by_media_type.get(media_type)
    }
}

/// Outcome of decoding a body's bytes into a value the evaluator can check.
pub enum DecodeOutcome {
    /// Decoded successfully.
    Value(serde_json::Value),
    /// The body was empty.
    Empty,
    /// Decoding failed; carries a human message for `requestBody.parse` /
    /// `responseBody.parse`.
    ParseError(String),
}

/// Decode captured body bytes per the resolved media type (spec 4.4:
/// pluggable decoders). JSON is decoded directly; anything else requires a
/// registered [`BodyTransformer`] for that exact media type.
pub fn decode_body(bytes: &[u8], media_type: &str, transformers: &BodyTransformers) -> DecodeOutcome {
    if bytes.is_empty() {
        return DecodeOutcome::Empty;
    }

    if media_type == "application/json" || media_type.ends_with("+json") {
        return match serde_json::from_slice(bytes) {
            Ok(value) => DecodeOutcome::Value(value),
            Err(e) => DecodeOutcome::ParseError(format!("invalid JSON body: {e}")),
        };
    }

    match transformers.get(media_type) {
        Some(transformer) => match transformer.transform(bytes) {
            Ok(value) => DecodeOutcome::Value(value),
            Err(e) => DecodeOutcome::ParseError(format!("invalid {media_type} parsing: {e}")),
        },
        None => DecodeOutcome::ParseError(format!("no decoder configured for content-type '{media_type}'")),
    }
}
