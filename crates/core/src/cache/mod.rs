//! Read-through caches for every upstream lookup.
//!
//! All caches share one [`CacheStore`] and live in separate namespaces:
//! metadata by external id, indexer fan-out by title and kind, magnets and
//! file listings by content hash, and assembled streams by query.

mod memory;
mod sqlite;
mod store;
mod typed;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use store::{CacheNamespace, CacheStore, StoredEntry};
pub use typed::{CacheEntry, TypedCache};

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use crate::config::{CacheBackend, CacheConfig};
use crate::debrid::{Magnet, VideoFile};
use crate::indexer::SourcedCandidate;
use crate::media::{MediaKind, MediaMetadata, MediaQuery, Preferences, Stream};

/// Errors from a cache backend.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(String),
}

/// The typed caches used by the stream pipeline.
#[derive(Clone)]
pub struct Caches {
    pub metadata: TypedCache<MediaMetadata>,
    pub indexer_results: TypedCache<Vec<SourcedCandidate>>,
    pub magnets: TypedCache<Magnet>,
    pub file_listings: TypedCache<Vec<VideoFile>>,
    pub streams: TypedCache<Vec<Stream>>,
}

impl Caches {
    /// Build every cache on top of one store.
    pub fn new(store: Arc<dyn CacheStore>, streams_ttl: Option<Duration>) -> Self {
        Self {
            metadata: TypedCache::new(Arc::clone(&store), CacheNamespace::Metadata),
            indexer_results: TypedCache::new(Arc::clone(&store), CacheNamespace::IndexerResults),
            magnets: TypedCache::new(Arc::clone(&store), CacheNamespace::Magnets),
            file_listings: TypedCache::new(Arc::clone(&store), CacheNamespace::FileListings),
            streams: TypedCache::new(store, CacheNamespace::Streams).with_ttl(streams_ttl),
        }
    }

    /// In-memory caches (useful for testing).
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), None)
    }

    /// Open the configured backend.
    pub fn from_config(config: &CacheConfig) -> Result<Self, CacheError> {
        let store: Arc<dyn CacheStore> = match config.backend {
            CacheBackend::Memory => Arc::new(MemoryStore::new()),
            CacheBackend::Sqlite => Arc::new(SqliteStore::new(&config.path)?),
        };
        info!(
            backend = store.backend(),
            streams_ttl_secs = ?config.streams_ttl_secs,
            "Cache store ready"
        );
        Ok(Self::new(
            store,
            config.streams_ttl_secs.map(Duration::from_secs),
        ))
    }
}

/// Key for a merged indexer fan-out.
///
/// The season is part of the key because some indexers put it in the query.
pub fn indexer_results_key(title: &str, kind: MediaKind, season: Option<u32>) -> String {
    let mut key = format!("{}:{}", kind.as_str(), title.trim().to_lowercase());
    if let Some(season) = season {
        key.push_str(&format!(":S{:02}", season));
    }
    key
}

/// Key for an assembled stream list.
pub fn streams_key(query: &MediaQuery, preferences: &Preferences) -> String {
    format!("{}:{}", query.cache_key(), preferences.fingerprint())
}
