//! Bundle caching
//!
//! The [`Cache`] trait is the storage seam; [`CacheGate`] decides whether a
//! bundle is rebuilt or served from an existing entry.

mod file;
mod memory;

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{debug, info};

use crate::bundler::BundleKind;
use crate::error::{CacheError, Result};

pub use file::FileCache;
pub use memory::MemoryCache;

/// Key-value store holding built bundles
pub trait Cache: Send + Sync {
    /// Store `value` under `key`, replacing any previous entry
    fn put(&self, key: &str, value: &str) -> Result<(), CacheError>;

    /// Fetch the entry for `key`; `None` if absent or no longer usable
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Whether an entry exists for `key` and is still fresh
    fn is_usable(&self, key: &str) -> bool;

    /// Drop every entry
    fn clear(&self) -> Result<(), CacheError>;
}

/// Deterministic identifier of a bundle's cached artifact.
///
/// Derived from the bundle kind and name only. Fragment contents and version
/// do not participate, so an entry stays valid after its sources change
/// until it expires or the cache is cleared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn derive(kind: BundleKind, name: &str) -> Self {
        Self(STANDARD.encode(format!("{}-{}", kind.as_str(), name)))
    }

    /// Recover the bundle kind and name a key was derived from
    pub fn decode(key: &str) -> Option<(BundleKind, String)> {
        let raw = STANDARD.decode(key).ok()?;
        let raw = String::from_utf8(raw).ok()?;
        let (kind, name) = raw.split_once('-')?;
        Some((kind.parse().ok()?, name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Content produced by a fresh build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifact {
    pub cache_key: CacheKey,
    pub content: String,
    pub is_minified: bool,
}

/// Result of [`CacheGate::build_or_reuse`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// The build function ran and its output was stored
    Fresh(BuildArtifact),
    /// A usable entry already existed
    Reused(CacheKey),
}

/// Governs the build-or-reuse decision for one bundle
#[derive(Clone)]
pub struct CacheGate {
    cache: Arc<dyn Cache>,
    enabled: bool,
}

impl CacheGate {
    pub fn new(cache: Arc<dyn Cache>, enabled: bool) -> Self {
        Self { cache, enabled }
    }

    /// Run `build` unless caching is enabled and a usable entry exists.
    ///
    /// Fresh content is stored only after `build` succeeds.
    pub fn build_or_reuse<F>(&self, key: &CacheKey, build: F) -> Result<BuildOutcome>
    where
        F: FnOnce() -> Result<(String, bool)>,
    {
        if self.enabled && self.cache.is_usable(key.as_str()) {
            debug!("Reusing cached bundle {}", key);
            return Ok(BuildOutcome::Reused(key.clone()));
        }

        if !self.enabled {
            debug!("Caching disabled, rebuilding {}", key);
        }

        self.build_and_store(key, build).map(BuildOutcome::Fresh)
    }

    /// Content for `key`, building it first when no usable entry exists
    pub fn retrieve<F>(&self, key: &CacheKey, build: F) -> Result<String>
    where
        F: FnOnce() -> Result<(String, bool)>,
    {
        if self.enabled && self.cache.is_usable(key.as_str()) {
            // The entry may still expire between the check and the read
            if let Some(content) = self.cache.get(key.as_str())? {
                debug!("Embedding cached bundle {}", key);
                return Ok(content);
            }
        }

        self.build_and_store(key, build).map(|artifact| artifact.content)
    }

    fn build_and_store<F>(&self, key: &CacheKey, build: F) -> Result<BuildArtifact>
    where
        F: FnOnce() -> Result<(String, bool)>,
    {
        let (content, is_minified) = build()?;
        self.cache.put(key.as_str(), &content)?;
        info!("Stored bundle {} ({} bytes)", key, content.len());

        Ok(BuildArtifact {
            cache_key: key.clone(),
            content,
            is_minified,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::error::OrganizerError;

    /// Cache double recording every call
    #[derive(Default)]
    pub(crate) struct CountingCache {
        pub inner: MemoryCache,
        pub puts: AtomicUsize,
        pub gets: AtomicUsize,
    }

    impl Cache for CountingCache {
        fn put(&self, key: &str, value: &str) -> Result<(), CacheError> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            self.inner.put(key, value)
        }

        fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            self.inner.get(key)
        }

        fn is_usable(&self, key: &str) -> bool {
            self.inner.is_usable(key)
        }

        fn clear(&self) -> Result<(), CacheError> {
            self.inner.clear()
        }
    }

    #[test]
    fn test_cache_key_is_base64_of_kind_and_name() {
        let key = CacheKey::derive(BundleKind::Script, "myBundle");
        assert_eq!(key.as_str(), "c2NyaXB0LW15QnVuZGxl");
        assert_eq!(key, CacheKey::derive(BundleKind::Script, "myBundle"));
        assert_ne!(key, CacheKey::derive(BundleKind::Style, "myBundle"));
    }

    #[test]
    fn test_cache_key_decode() {
        let key = CacheKey::derive(BundleKind::Style, "site-theme");
        assert_eq!(
            CacheKey::decode(key.as_str()),
            Some((BundleKind::Style, "site-theme".to_string()))
        );
        assert_eq!(CacheKey::decode("not base64!"), None);
        assert_eq!(CacheKey::decode(&STANDARD.encode("font-x")), None);
    }

    #[test]
    fn test_gate_reuses_usable_entry() {
        let cache = Arc::new(CountingCache::default());
        let gate = CacheGate::new(cache.clone(), true);
        let key = CacheKey::derive(BundleKind::Script, "app");

        let first = gate
            .build_or_reuse(&key, || Ok(("one".to_string(), false)))
            .unwrap();
        assert!(matches!(first, BuildOutcome::Fresh(_)));

        let second = gate
            .build_or_reuse(&key, || panic!("must not rebuild"))
            .unwrap();
        assert_eq!(second, BuildOutcome::Reused(key.clone()));
        assert_eq!(cache.puts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_gate_rebuilds_when_disabled() {
        let cache = Arc::new(CountingCache::default());
        let gate = CacheGate::new(cache.clone(), false);
        let key = CacheKey::derive(BundleKind::Style, "app");

        for _ in 0..3 {
            let outcome = gate
                .build_or_reuse(&key, || Ok(("body{}".to_string(), true)))
                .unwrap();
            match outcome {
                BuildOutcome::Fresh(artifact) => assert!(artifact.is_minified),
                other => panic!("expected fresh build, got {other:?}"),
            }
        }
        assert_eq!(cache.puts.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_failed_build_stores_nothing() {
        let cache = Arc::new(CountingCache::default());
        let gate = CacheGate::new(cache.clone(), true);
        let key = CacheKey::derive(BundleKind::Script, "broken");

        let result = gate.build_or_reuse(&key, || {
            Err(OrganizerError::FileNotFound {
                path: "/assets/missing.js".into(),
            })
        });

        assert!(result.is_err());
        assert_eq!(cache.puts.load(Ordering::SeqCst), 0);
        assert!(!cache.is_usable(key.as_str()));
    }

    #[test]
    fn test_retrieve_prefers_cache() {
        let cache = Arc::new(CountingCache::default());
        let gate = CacheGate::new(cache.clone(), true);
        let key = CacheKey::derive(BundleKind::Script, "app");
        cache.inner.put(key.as_str(), "cached").unwrap();

        let content = gate.retrieve(&key, || panic!("must not rebuild")).unwrap();
        assert_eq!(content, "cached");
    }

    #[test]
    fn test_retrieve_builds_when_missing() {
        let cache = Arc::new(CountingCache::default());
        let gate = CacheGate::new(cache.clone(), true);
        let key = CacheKey::derive(BundleKind::Script, "app");

        let content = gate
            .retrieve(&key, || Ok(("fresh".to_string(), false)))
            .unwrap();
        assert_eq!(content, "fresh");
        assert_eq!(cache.inner.get(key.as_str()).unwrap().as_deref(), Some("fresh"));
    }
}
