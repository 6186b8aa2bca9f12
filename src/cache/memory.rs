//! In-process cache backend

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use super::Cache;
use crate::error::CacheError;

struct Entry {
    value: String,
    stored_at: Instant,
}

/// Cache keeping bundles in memory for the lifetime of the process
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
    expiry: Option<Duration>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries older than `expiry` stop being usable
    pub fn with_expiry(expiry: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            expiry: Some(expiry),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn is_fresh(&self, entry: &Entry) -> bool {
        self.expiry
            .map_or(true, |expiry| entry.stored_at.elapsed() < expiry)
    }
}

impl Cache for MemoryCache {
    fn put(&self, key: &str, value: &str) -> Result<(), CacheError> {
        self.entries.write().insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                stored_at: Instant::now(),
            },
        );
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self.entries.read();
        Ok(entries
            .get(key)
            .filter(|entry| self.is_fresh(entry))
            .map(|entry| entry.value.clone()))
    }

    fn is_usable(&self, key: &str) -> bool {
        self.entries
            .read()
            .get(key)
            .is_some_and(|entry| self.is_fresh(entry))
    }

    fn clear(&self) -> Result<(), CacheError> {
        self.entries.write().clear();
        Ok(())
    }
}
