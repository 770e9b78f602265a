//! Storage abstraction shared by the cache backends.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CacheError;

/// Independent key spaces held by one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheNamespace {
    /// Title metadata keyed by external id.
    Metadata,
    /// Merged indexer fan-out keyed by title and media kind.
    IndexerResults,
    /// Debrid magnets keyed by content hash.
    Magnets,
    /// Debrid file listings keyed by content hash.
    FileListings,
    /// Assembled stream lists keyed by query and preference fingerprint.
    Streams,
}

impl CacheNamespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheNamespace::Metadata => "metadata",
            CacheNamespace::IndexerResults => "indexer_results",
            CacheNamespace::Magnets => "magnets",
            CacheNamespace::FileListings => "file_listings",
            CacheNamespace::Streams => "streams",
        }
    }

    pub fn all() -> [CacheNamespace; 5] {
        [
            CacheNamespace::Metadata,
            CacheNamespace::IndexerResults,
            CacheNamespace::Magnets,
            CacheNamespace::FileListings,
            CacheNamespace::Streams,
        ]
    }
}

/// A raw stored value with its bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    pub key: String,
    /// JSON-encoded value.
    pub payload: String,
    pub stored_at: DateTime<Utc>,
    /// Monotonic write order across the whole store; rewriting a key assigns a new one.
    pub sequence: u64,
}

/// Key-value storage behind every cache.
///
/// Writes replace the previous value for the key (last writer wins).
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Backend name for logging.
    fn backend(&self) -> &'static str;

    async fn get(
        &self,
        namespace: CacheNamespace,
        key: &str,
    ) -> Result<Option<StoredEntry>, CacheError>;

    async fn put(
        &self,
        namespace: CacheNamespace,
        key: &str,
        payload: String,
    ) -> Result<StoredEntry, CacheError>;

    /// Remove a key. Returns whether it existed.
    async fn remove(&self, namespace: CacheNamespace, key: &str) -> Result<bool, CacheError>;

    /// All entries of a namespace, oldest write first.
    async fn entries(&self, namespace: CacheNamespace) -> Result<Vec<StoredEntry>, CacheError>;
}
