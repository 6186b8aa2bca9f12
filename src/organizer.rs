//! Host-facing entry point
//!
//! An [`Organizer`] owns the configuration and the cache shared by every
//! bundler it creates.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::bundler::{BundleKind, Bundler};
use crate::cache::{Cache, CacheKey, FileCache, MemoryCache};
use crate::config::{BundleDecl, CacheBackend, Config};
use crate::error::{OrganizerError, Result};

/// Creates bundlers sharing one configuration and cache
#[derive(Clone)]
pub struct Organizer {
    config: Arc<Config>,
    cache: Arc<dyn Cache>,
}

impl Organizer {
    /// Create an organizer with the cache backend named in `config`
    pub fn new(config: Config) -> Self {
        let cache: Arc<dyn Cache> = match config.cache.backend {
            CacheBackend::File => Arc::new(FileCache::new(config.cache_dir(), config.cache_expiry())),
            CacheBackend::Memory => match config.cache_expiry() {
                Some(expiry) => Arc::new(MemoryCache::with_expiry(expiry)),
                None => Arc::new(MemoryCache::new()),
            },
        };

        Self::with_cache(config, cache)
    }

    /// Create an organizer around an existing cache
    pub fn with_cache(config: Config, cache: Arc<dyn Cache>) -> Self {
        Self {
            config: Arc::new(config),
            cache,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &Arc<dyn Cache> {
        &self.cache
    }

    /// Create an empty bundler of the given kind
    pub fn bundler(&self, kind: BundleKind, name: &str, version: &str) -> Bundler {
        Bundler::new(kind, name, version, &self.config, self.cache.clone())
    }

    pub fn style(&self, name: &str, version: &str) -> Bundler {
        self.bundler(BundleKind::Style, name, version)
    }

    pub fn script(&self, name: &str, version: &str) -> Bundler {
        self.bundler(BundleKind::Script, name, version)
    }

    /// Create a bundler for a bundle declared in the configuration
    pub fn declared(&self, name: &str) -> Result<Bundler> {
        let decl = self
            .config
            .bundle(name)
            .ok_or_else(|| OrganizerError::UnknownBundle(name.to_string()))?;

        self.from_decl(decl)
    }

    /// Bundlers for every declared bundle, in declaration order
    pub fn declared_all(&self) -> Result<Vec<Bundler>> {
        self.config
            .bundles
            .iter()
            .map(|decl| self.from_decl(decl))
            .collect()
    }

    fn from_decl(&self, decl: &BundleDecl) -> Result<Bundler> {
        let kind = match decl.kind {
            Some(kind) => kind,
            None => infer_kind(decl).ok_or_else(|| OrganizerError::UnresolvedKind(decl.name.clone()))?,
        };

        let mut bundler = self.bundler(kind, &decl.name, &decl.version);
        for files in &decl.files {
            bundler.add_value(files)?;
        }
        for code in &decl.inline {
            bundler.add_inline(code.as_str())?;
        }

        Ok(bundler)
    }

    /// Cached content for a key taken from a bundle URL.
    ///
    /// Returns `None` for keys that do not decode to a bundle identity and
    /// for bundles without a usable cache entry.
    pub fn lookup(&self, key: &str) -> Result<Option<String>> {
        let Some((kind, name)) = CacheKey::decode(key) else {
            debug!("Rejected malformed bundle key {:?}", key);
            return Ok(None);
        };

        if !self.cache.is_usable(key) {
            debug!("No usable {} bundle '{}'", kind, name);
            return Ok(None);
        }

        Ok(self.cache.get(key)?)
    }
}

/// Kind implied by the first declared file's extension
fn infer_kind(decl: &BundleDecl) -> Option<BundleKind> {
    let first = decl.files.iter().find_map(|v| v.as_str())?;
    let ext = Path::new(first).extension()?.to_str()?;
    BundleKind::from_extension(ext)
}
