//! In-process cache store.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use moka::future::Cache;

use super::{CacheError, CacheNamespace, CacheStore, StoredEntry};

/// Concurrent in-memory store; lookups never wait on writes to other keys.
///
/// Unbounded: entries only leave through `remove`, so the magnet namespace
/// stays an exact record of what the debrid account holds.
pub struct MemoryStore {
    entries: Cache<(CacheNamespace, String), StoredEntry>,
    sequence: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Cache::builder().build(),
            sequence: AtomicU64::new(0),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get(
        &self,
        namespace: CacheNamespace,
        key: &str,
    ) -> Result<Option<StoredEntry>, CacheError> {
        Ok(self.entries.get(&(namespace, key.to_string())).await)
    }

    async fn put(
        &self,
        namespace: CacheNamespace,
        key: &str,
        payload: String,
    ) -> Result<StoredEntry, CacheError> {
        let entry = StoredEntry {
            key: key.to_string(),
            payload,
            stored_at: Utc::now(),
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst) + 1,
        };
        self.entries
            .insert((namespace, key.to_string()), entry.clone())
            .await;
        Ok(entry)
    }

    async fn remove(&self, namespace: CacheNamespace, key: &str) -> Result<bool, CacheError> {
        Ok(self
            .entries
            .remove(&(namespace, key.to_string()))
            .await
            .is_some())
    }

    async fn entries(&self, namespace: CacheNamespace) -> Result<Vec<StoredEntry>, CacheError> {
        let mut entries: Vec<StoredEntry> = self
            .entries
            .iter()
            .filter(|(key, _)| key.0 == namespace)
            .map(|(_, entry)| entry)
            .collect();
        entries.sort_by_key(|e| e.sequence);
        Ok(entries)
    }
}
