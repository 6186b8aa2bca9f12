//! File system cache backend
//!
//! Each entry lives in its own file below the cache directory. Freshness is
//! judged from the file's modification time.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use tracing::{debug, warn};

use super::Cache;
use crate::error::CacheError;
use crate::utils::hash_content;

const ENTRY_EXTENSION: &str = "cache";

/// Distinguishes staging files of writers within one process
static STAGING_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Cache persisting bundles as files
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
    expiry: Option<Duration>,
}

impl FileCache {
    /// Create a cache rooted at `dir`; `expiry` of `None` keeps entries forever
    pub fn new(dir: impl Into<PathBuf>, expiry: Option<Duration>) -> Self {
        Self {
            dir: dir.into(),
            expiry,
        }
    }

    /// Path of the file holding `key`
    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", hash_content(key.as_bytes()), ENTRY_EXTENSION))
    }

    fn is_fresh(&self, path: &Path) -> bool {
        let Ok(metadata) = fs::metadata(path) else {
            return false;
        };
        if !metadata.is_file() {
            return false;
        }

        let Some(expiry) = self.expiry else {
            return true;
        };

        metadata
            .modified()
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok())
            .map_or(true, |age| age < expiry)
    }
}

impl Cache for FileCache {
    fn put(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let path = self.entry_path(key);

        fs::create_dir_all(&self.dir).map_err(|source| CacheError::Write {
            path: self.dir.clone(),
            source,
        })?;

        // Each writer stages its own file; the rename publishes it whole
        let staging = path.with_extension(format!(
            "{}.{}.tmp",
            process::id(),
            STAGING_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        if let Err(source) = fs::write(&staging, value).and_then(|_| fs::rename(&staging, &path)) {
            let _ = fs::remove_file(&staging);
            return Err(CacheError::Write { path, source });
        }

        debug!("Wrote cache entry {}", path.display());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let path = self.entry_path(key);
        if !self.is_fresh(&path) {
            return Ok(None);
        }

        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(CacheError::Read { path, source }),
        }
    }

    fn is_usable(&self, key: &str) -> bool {
        self.is_fresh(&self.entry_path(key))
    }

    fn clear(&self) -> Result<(), CacheError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(source) => {
                return Err(CacheError::Clear {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXTENSION) {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(err) => warn!("Failed to remove {}: {}", path.display(), err),
            }
        }

        debug!("Removed {} cache entries from {}", removed, self.dir.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_put_get_roundtrip_creates_dir() {
        let dir = TempDir::new().unwrap();
        let cache = FileCache::new(dir.path().join("nested/cache"), None);

        assert!(!cache.is_usable("key"));
        cache.put("key", "content").unwrap();

        assert!(cache.is_usable("key"));
        assert_eq!(cache.get("key").unwrap().as_deref(), Some("content"));
        assert!(cache.entry_path("key").is_file());
    }

    #[test]
    fn test_expired_entry() {
        let dir = TempDir::new().unwrap();
        let cache = FileCache::new(dir.path(), Some(Duration::ZERO));
        cache.put("key", "content").unwrap();

        assert!(!cache.is_usable("key"));
        assert_eq!(cache.get("key").unwrap(), None);
    }

    #[test]
    fn test_clear_only_removes_entries() {
        let dir = TempDir::new().unwrap();
        let cache = FileCache::new(dir.path(), None);
        cache.put("a", "1").unwrap();
        cache.put("b", "2").unwrap();
        fs::write(dir.path().join("keep.txt"), "x").unwrap();

        cache.clear().unwrap();

        assert!(!cache.is_usable("a"));
        assert!(!cache.is_usable("b"));
        assert!(dir.path().join("keep.txt").exists());
    }

    #[test]
    fn test_concurrent_writers_publish_whole_entries() {
        let dir = TempDir::new().unwrap();
        let cache = FileCache::new(dir.path(), None);
        let values: Vec<String> = (0..8)
            .map(|i| i.to_string().repeat(64 * 1024))
            .collect();

        std::thread::scope(|scope| {
            for value in &values {
                let cache = &cache;
                scope.spawn(move || cache.put("key", value).unwrap());
            }
        });

        let stored = cache.get("key").unwrap().unwrap();
        assert!(values.contains(&stored));

        let leftovers = fs::read_dir(dir.path())
            .unwrap()
            .flatten()
            .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_clear_missing_dir_is_ok() {
        let dir = TempDir::new().unwrap();
        let cache = FileCache::new(dir.path().join("absent"), None);
        cache.clear().unwrap();
    }
}
