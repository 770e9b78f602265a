//! Concurrent, fail-soft search across every configured indexer.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tracing::{debug, info, warn};

use super::{Indexer, IndexerError, RawCandidate, SearchRequest, SourcedCandidate};
use crate::metrics::{record_external_call, SEARCH_RESULTS};

/// The indexers queried for every title.
#[derive(Clone)]
pub struct IndexerSet {
    indexers: Vec<Arc<dyn Indexer>>,
    timeout: Duration,
}

impl IndexerSet {
    /// `timeout` bounds every individual indexer call.
    pub fn new(indexers: Vec<Arc<dyn Indexer>>, timeout: Duration) -> Self {
        Self { indexers, timeout }
    }

    pub fn is_empty(&self) -> bool {
        self.indexers.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.indexers.iter().map(|i| i.name().to_string()).collect()
    }

    /// Search all indexers concurrently and merge their results in indexer order.
    ///
    /// An indexer whose primary title yields nothing is retried once with
    /// `alternate` when it differs. Failures only shrink the result.
    pub async fn search(
        &self,
        request: &SearchRequest,
        alternate: Option<&str>,
    ) -> Vec<SourcedCandidate> {
        let searches = self.indexers.iter().map(|indexer| async move {
            let candidates =
                search_with_fallback(indexer.as_ref(), request, alternate, self.timeout).await;
            candidates
                .into_iter()
                .map(|candidate| SourcedCandidate {
                    source: indexer.name().to_string(),
                    candidate,
                })
                .collect::<Vec<_>>()
        });

        let merged: Vec<SourcedCandidate> = join_all(searches).await.into_iter().flatten().collect();
        info!(
            title = %request.title,
            indexers = self.indexers.len(),
            count = merged.len(),
            "Indexer fan-out complete"
        );
        merged
    }

    /// Fetch a candidate's content hash from the indexer that produced it.
    pub async fn resolve_hash(&self, source: &str, id: &str) -> Option<String> {
        let Some(indexer) = self.indexers.iter().find(|i| i.name() == source) else {
            warn!(indexer = source, id, "Hash lookup for unknown indexer");
            return None;
        };

        let started = Instant::now();
        let outcome = bounded(self.timeout, indexer.resolve_hash(id)).await;
        match outcome {
            Ok(hash) => {
                record_external_call(source, "resolve_hash", "success", started);
                if hash.is_none() {
                    debug!(indexer = source, id, "No hash for candidate");
                }
                hash
            }
            Err(e) => {
                record_external_call(source, "resolve_hash", error_status(&e), started);
                warn!(indexer = source, id, error = %e, "Hash lookup failed");
                None
            }
        }
    }
}

/// Search one indexer, retrying exactly once with a distinct alternate title.
pub async fn search_with_fallback(
    indexer: &dyn Indexer,
    request: &SearchRequest,
    alternate: Option<&str>,
    timeout: Duration,
) -> Vec<RawCandidate> {
    let primary = search_once(indexer, request, timeout).await;
    if !primary.is_empty() {
        return primary;
    }

    match alternate.map(str::trim) {
        Some(alt) if !alt.is_empty() && !alt.eq_ignore_ascii_case(request.title.trim()) => {
            info!(
                indexer = indexer.name(),
                title = %request.title,
                alternate = alt,
                "No results, retrying with alternate title"
            );
            search_once(indexer, &request.with_title(alt), timeout).await
        }
        _ => primary,
    }
}

async fn search_once(
    indexer: &dyn Indexer,
    request: &SearchRequest,
    timeout: Duration,
) -> Vec<RawCandidate> {
    let started = Instant::now();
    match bounded(timeout, indexer.search(request)).await {
        Ok(candidates) => {
            record_external_call(indexer.name(), "search", "success", started);
            SEARCH_RESULTS
                .with_label_values(&[indexer.name()])
                .observe(candidates.len() as f64);
            debug!(
                indexer = indexer.name(),
                title = %request.title,
                count = candidates.len(),
                "Search complete"
            );
            candidates
        }
        Err(e) => {
            record_external_call(indexer.name(), "search", error_status(&e), started);
            warn!(
                indexer = indexer.name(),
                title = %request.title,
                error = %e,
                "Search failed, treating as empty"
            );
            Vec::new()
        }
    }
}

async fn bounded<T>(
    timeout: Duration,
    call: impl std::future::Future<Output = Result<T, IndexerError>>,
) -> Result<T, IndexerError> {
    tokio::time::timeout(timeout, call)
        .await
        .unwrap_or(Err(IndexerError::Timeout))
}

fn error_status(e: &IndexerError) -> &'static str {
    match e {
        IndexerError::Timeout => "timeout",
        _ => "error",
    }
}
