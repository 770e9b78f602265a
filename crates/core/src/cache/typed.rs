//! Serde-typed view over one cache namespace.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::{CacheError, CacheNamespace, CacheStore, StoredEntry};
use crate::metrics::CACHE_LOOKUPS;

/// A decoded cache entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<V> {
    pub key: String,
    pub value: V,
    pub stored_at: DateTime<Utc>,
    pub sequence: u64,
}

/// Typed cache over a single namespace of a [`CacheStore`].
///
/// Storage and decode failures are logged and reported as misses, so a
/// broken cache only costs a refetch.
pub struct TypedCache<V> {
    store: Arc<dyn CacheStore>,
    namespace: CacheNamespace,
    ttl: Option<Duration>,
    _value: PhantomData<fn() -> V>,
}

impl<V> Clone for TypedCache<V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            namespace: self.namespace,
            ttl: self.ttl,
            _value: PhantomData,
        }
    }
}

impl<V> TypedCache<V>
where
    V: Serialize + DeserializeOwned + Send,
{
    pub fn new(store: Arc<dyn CacheStore>, namespace: CacheNamespace) -> Self {
        Self {
            store,
            namespace,
            ttl: None,
            _value: PhantomData,
        }
    }

    /// Treat entries older than `ttl` as missing.
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn namespace(&self) -> CacheNamespace {
        self.namespace
    }

    /// Look up a key.
    pub async fn get(&self, key: &str) -> Option<V> {
        self.get_entry(key).await.map(|entry| entry.value)
    }

    /// Look up a key together with its bookkeeping.
    pub async fn get_entry(&self, key: &str) -> Option<CacheEntry<V>> {
        let entry = match self.store.get(self.namespace, key).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(cache = self.namespace.as_str(), key, error = %e, "Cache read failed");
                None
            }
        };

        let decoded = entry
            .filter(|entry| !self.is_expired(entry))
            .and_then(|entry| self.decode(entry));

        let result = if decoded.is_some() { "hit" } else { "miss" };
        CACHE_LOOKUPS
            .with_label_values(&[self.namespace.as_str(), result])
            .inc();
        debug!(cache = self.namespace.as_str(), key, result, "Cache lookup");

        decoded
    }

    /// Store a value, replacing any previous one.
    pub async fn put(&self, key: &str, value: &V) {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(cache = self.namespace.as_str(), key, error = %e, "Cache encode failed");
                return;
            }
        };

        if let Err(e) = self.store.put(self.namespace, key, payload).await {
            warn!(cache = self.namespace.as_str(), key, error = %e, "Cache write failed");
        }
    }

    pub async fn remove(&self, key: &str) -> Result<bool, CacheError> {
        self.store.remove(self.namespace, key).await
    }

    /// Every decodable entry, oldest write first.
    pub async fn entries(&self) -> Result<Vec<CacheEntry<V>>, CacheError> {
        let entries = self.store.entries(self.namespace).await?;
        Ok(entries
            .into_iter()
            .filter_map(|entry| self.decode(entry))
            .collect())
    }

    /// Return the cached value, or fetch it once and write it through.
    pub async fn read_through<F, Fut, E>(&self, key: &str, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        self.read_through_when(key, |_| true, fetch).await
    }

    /// Like [`read_through`](Self::read_through), but only values accepted by
    /// `keep` are written back.
    pub async fn read_through_when<K, F, Fut, E>(
        &self,
        key: &str,
        keep: K,
        fetch: F,
    ) -> Result<V, E>
    where
        K: FnOnce(&V) -> bool,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }

        let value = fetch().await?;
        if keep(&value) {
            self.put(key, &value).await;
        }
        Ok(value)
    }

    fn is_expired(&self, entry: &StoredEntry) -> bool {
        match self.ttl {
            Some(ttl) => {
                let age = Utc::now().signed_duration_since(entry.stored_at);
                age.to_std().map(|age| age > ttl).unwrap_or(false)
            }
            None => false,
        }
    }

    fn decode(&self, entry: StoredEntry) -> Option<CacheEntry<V>> {
        match serde_json::from_str(&entry.payload) {
            Ok(value) => Some(CacheEntry {
                key: entry.key,
                value,
                stored_at: entry.stored_at,
                sequence: entry.sequence,
            }),
            Err(e) => {
                warn!(
                    cache = self.namespace.as_str(),
                    key = %entry.key,
                    error = %e,
                    "Dropping undecodable cache entry"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cache() -> TypedCache<Vec<String>> {
        TypedCache::new(Arc::new(MemoryStore::new()), CacheNamespace::IndexerResults)
    }

    #[tokio::test]
    async fn test_read_through_fetches_once() {
        let cache = cache();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Result<Vec<String>, ()> = cache
                .read_through("k", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec!["a".to_string()])
                })
                .await;
            assert_eq!(value.unwrap(), vec!["a"]);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_read_through_does_not_store_errors() {
        let cache = cache();
        let failed: Result<Vec<String>, &str> = cache.read_through("k", || async { Err("down") }).await;
        assert!(failed.is_err());
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test]
    async fn test_read_through_when_skips_rejected_values() {
        let cache = cache();
        let value: Result<Vec<String>, ()> = cache
            .read_through_when("k", |v: &Vec<String>| !v.is_empty(), || async { Ok(Vec::new()) })
            .await;
        assert!(value.unwrap().is_empty());
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_a_miss() {
        let store = Arc::new(MemoryStore::new());
        store
            .put(CacheNamespace::IndexerResults, "k", "not json".to_string())
            .await
            .unwrap();
        let cache: TypedCache<Vec<String>> =
            TypedCache::new(store, CacheNamespace::IndexerResults);
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test]
    async fn test_ttl_expires_entries() {
        let cache = cache().with_ttl(Some(Duration::from_millis(20)));
        cache.put("k", &vec!["a".to_string()]).await;
        assert!(cache.get("k").await.is_some());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(cache.get("k").await.is_none());
    }
}
