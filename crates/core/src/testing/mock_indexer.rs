//! Mock indexer for testing.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::indexer::{Indexer, IndexerError, RawCandidate, SearchRequest};

/// Mock implementation of the [`Indexer`] trait.
///
/// Results are keyed by search title (case-insensitive). A title with no
/// configured results falls back to the catch-all list set with
/// [`set_results`](Self::set_results), which is empty by default.
pub struct MockIndexer {
    name: String,
    results_by_title: Arc<RwLock<HashMap<String, Vec<RawCandidate>>>>,
    default_results: Arc<RwLock<Vec<RawCandidate>>>,
    failing_titles: Arc<RwLock<HashSet<String>>>,
    hashes: Arc<RwLock<HashMap<String, String>>>,
    delay: Arc<RwLock<Option<Duration>>>,
    searches: Arc<RwLock<Vec<SearchRequest>>>,
    hash_lookups: Arc<RwLock<Vec<String>>>,
}

impl MockIndexer {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            results_by_title: Arc::new(RwLock::new(HashMap::new())),
            default_results: Arc::new(RwLock::new(Vec::new())),
            failing_titles: Arc::new(RwLock::new(HashSet::new())),
            hashes: Arc::new(RwLock::new(HashMap::new())),
            delay: Arc::new(RwLock::new(None)),
            searches: Arc::new(RwLock::new(Vec::new())),
            hash_lookups: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Results returned when searching for `title`.
    pub async fn set_results_for(&self, title: &str, results: Vec<RawCandidate>) {
        self.results_by_title
            .write()
            .await
            .insert(title.to_lowercase(), results);
    }

    /// Results returned for any title without specific results.
    pub async fn set_results(&self, results: Vec<RawCandidate>) {
        *self.default_results.write().await = results;
    }

    /// Make searches for `title` fail.
    pub async fn fail_searches_for(&self, title: &str) {
        self.failing_titles
            .write()
            .await
            .insert(title.to_lowercase());
    }

    /// Delay every search by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Hash returned by `resolve_hash` for candidate `id`.
    pub async fn set_hash(&self, id: &str, hash: &str) {
        self.hashes
            .write()
            .await
            .insert(id.to_string(), hash.to_string());
    }

    /// Titles searched so far, in call order.
    pub async fn searched_titles(&self) -> Vec<String> {
        self.searches
            .read()
            .await
            .iter()
            .map(|r| r.title.clone())
            .collect()
    }

    /// Requests received so far, in call order.
    pub async fn recorded_searches(&self) -> Vec<SearchRequest> {
        self.searches.read().await.clone()
    }

    pub async fn search_count(&self) -> usize {
        self.searches.read().await.len()
    }

    /// Candidate ids passed to `resolve_hash`, in call order.
    pub async fn hash_lookups(&self) -> Vec<String> {
        self.hash_lookups.read().await.clone()
    }
}

#[async_trait]
impl Indexer for MockIndexer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<RawCandidate>, IndexerError> {
        self.searches.write().await.push(request.clone());

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let title = request.title.to_lowercase();
        if self.failing_titles.read().await.contains(&title) {
            return Err(IndexerError::Api {
                status: 500,
                message: "mock failure".to_string(),
            });
        }

        if let Some(results) = self.results_by_title.read().await.get(&title) {
            return Ok(results.clone());
        }
        Ok(self.default_results.read().await.clone())
    }

    async fn resolve_hash(&self, id: &str) -> Result<Option<String>, IndexerError> {
        self.hash_lookups.write().await.push(id.to_string());
        Ok(self.hashes.read().await.get(id).cloned())
    }
}
