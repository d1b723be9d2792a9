//! Schema compilation cache (C1).
//!
//! Thread-safe caching of compiled JSON-Schema validators, eliminating
//! per-request compilation overhead. Adapted from this codebase's own
//! `validator_cache::ValidatorCache`, generalized from a
//! `{handler}:{kind}:{status}` string key to the fingerprint keys this
//! crate's spec requires, and widened from a single `HashMap` behind one
//! `RwLock` to a `DashMap` so unrelated keys never contend on the same lock.

use crate::fingerprint::Fingerprint;
use dashmap::DashMap;
use jsonschema::Validator;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Bundle of artifacts produced for one schema fingerprint: the rendered
/// (fully `$ref`-expanded) schema as both bytes (for C6's YAML re-parse) and
/// JSON, plus the compiled evaluator handle. `compiled` is `None` when
/// compilation failed — the failure is cached too, so render+compile is
/// never retried for a schema already known to be broken.
#[derive(Clone)]
pub struct CacheEntry {
    pub rendered_yaml: Arc<str>,
    pub rendered_json: Value,
    pub compiled: Option<Arc<Validator>>,
}

/// Load/store/range contract a schema cache must satisfy (section 6: Schema
/// cache interface). Safe for concurrent callers; `store` on an
/// already-present key replaces the value, but since render+compile is
/// idempotent the winner is irrelevant.
pub trait SchemaCache: Send + Sync {
    fn load(&self, fingerprint: &Fingerprint) -> Option<CacheEntry>;
    fn store(&self, fingerprint: Fingerprint, entry: CacheEntry);
    /// Iterate all entries; stop early when `visit` returns `false`.
    fn range(&self, visit: &mut dyn FnMut(&Fingerprint, &CacheEntry) -> bool);
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Default concurrent-safe in-memory implementation, backed by `DashMap` so
/// loads of unrelated keys never block on the same shard lock.
#[derive(Clone, Default)]
pub struct InMemorySchemaCache {
    entries: Arc<DashMap<Fingerprint, CacheEntry>>,
}

impl InMemorySchemaCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SchemaCache for InMemorySchemaCache {
    fn load(&self, fingerprint: &Fingerprint) -> Option<CacheEntry> {
        let entry = self.entries.get(fingerprint).map(|e| e.value().clone());
        if entry.is_some() {
            debug!(fingerprint = %fingerprint, "schema cache hit");
        }
        entry
    }

    fn store(&self, fingerprint: Fingerprint, entry: CacheEntry) {
        self.entries.insert(fingerprint, entry);
        info!(fingerprint = %fingerprint, cache_size = self.entries.len(), "schema cache entry stored");
    }

    fn range(&self, visit: &mut dyn FnMut(&Fingerprint, &CacheEntry) -> bool) {
        for item in self.entries.iter() {
            if !visit(item.key(), item.value()) {
                break;
            }
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Optional cache for compiled regular expressions used by the path
/// matcher's fallback (section 4.2).
pub trait RegexCache: Send + Sync {
    fn load(&self, pattern: &str) -> Option<Arc<Regex>>;
    fn store(&self, pattern: String, compiled: Arc<Regex>);
}

#[derive(Clone, Default)]
pub struct InMemoryRegexCache {
    entries: Arc<DashMap<String, Arc<Regex>>>,
}

impl InMemoryRegexCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RegexCache for InMemoryRegexCache {
    fn load(&self, pattern: &str) -> Option<Arc<Regex>> {
        self.entries.get(pattern).map(|e| e.value().clone())
    }

    fn store(&self, pattern: String, compiled: Arc<Regex>) {
        self.entries.insert(pattern, compiled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(marker: &str) -> CacheEntry {
        CacheEntry {
            rendered_yaml: Arc::from(marker),
            rendered_json: json!({"type": "object"}),
            compiled: None,
        }
    }

    fn fp(byte: u8) -> Fingerprint {
        Fingerprint([byte; 32])
    }

    #[test]
    fn miss_then_hit() {
        let cache = InMemorySchemaCache::new();
        assert!(cache.load(&fp(1)).is_none());
        cache.store(fp(1), entry("a"));
        let hit = cache.load(&fp(1)).expect("should be present after store");
        assert_eq!(&*hit.rendered_yaml, "a");
    }

    #[test]
    fn store_replaces_existing_key() {
        let cache = InMemorySchemaCache::new();
        cache.store(fp(1), entry("first"));
        cache.store(fp(1), entry("second"));
        assert_eq!(cache.len(), 1);
        assert_eq!(&*cache.load(&fp(1)).unwrap().rendered_yaml, "second");
    }

    #[test]
    fn range_visits_all_until_stopped() {
        let cache = InMemorySchemaCache::new();
        for i in 0..5u8 {
            cache.store(fp(i), entry("x"));
        }
        let mut seen = 0;
        cache.range(&mut |_, _| {
            seen += 1;
            seen < 3
        });
        assert_eq!(seen, 3);
    }

    #[test]
    fn monotonicity_once_stored_always_loadable() {
        let cache = InMemorySchemaCache::new();
        cache.store(fp(7), entry("warmed"));
        for _ in 0..10 {
            let loaded = cache.load(&fp(7)).expect("entry must remain loadable");
            assert_eq!(&*loaded.rendered_yaml, "warmed");
        }
    }

    #[test]
    fn compile_failure_is_cached_with_nil_handle() {
        let cache = InMemorySchemaCache::new();
        let broken = CacheEntry {
            rendered_yaml: Arc::from("type: not-a-real-type"),
            rendered_json: json!({"type": "not-a-real-type"}),
            compiled: None,
        };
        cache.store(fp(9), broken);
        let loaded = cache.load(&fp(9)).unwrap();
        assert!(loaded.compiled.is_none());
    }

    #[test]
    fn regex_cache_hit() {
        let cache = InMemoryRegexCache::new();
        assert!(cache.load(r"^/users/(\w+)$").is_none());
        let compiled = Arc::new(Regex::new(r"^/users/(\w+)$").expect("valid pattern"));
        cache.store(r"^/users/(\w+)$".to_string(), compiled.clone());
        assert!(Arc::ptr_eq(&cache.load(r"^/users/(\w+)$").unwrap(), &compiled));
    }
}
