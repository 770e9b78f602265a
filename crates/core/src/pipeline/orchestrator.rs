//! Turns a media query into unlocked streams.
//!
//! Stages: metadata, indexer fan-out, classification and ranking, hash
//! resolution, one batched magnet upload, then per-magnet file listing and
//! unlocking until the output cap is reached. Every upstream failure only
//! shrinks the result.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tracing::{debug, info, warn};

use super::naming::build_stream;
use super::PipelineConfig;
use crate::cache::{indexer_results_key, streams_key, Caches};
use crate::classify::{
    classify, matches_nothing, presort_by_seeders, rank, rank_key, ClassifiedCandidate,
};
use crate::debrid::{
    select_video_files, DebridClient, DebridError, Magnet, MagnetRequest, VideoFile,
};
use crate::indexer::{IndexerSet, SearchRequest, SourcedCandidate};
use crate::media::{MediaKind, MediaMetadata, MediaQuery, Preferences, Stream};
use crate::metadata::{MetadataError, MetadataProvider};
use crate::metrics::{record_external_call, STREAMS_RETURNED, UNLOCK_FAILURES};
use crate::quota::QuotaScheduler;

/// A candidate whose content hash is known.
#[derive(Debug, Clone)]
struct ResolvedCandidate {
    hash: String,
    source: String,
}

/// Resolves media queries into ranked, unlocked streams.
pub struct StreamOrchestrator {
    metadata: Arc<dyn MetadataProvider>,
    indexers: IndexerSet,
    debrid: Arc<dyn DebridClient>,
    caches: Caches,
    quota: Option<Arc<QuotaScheduler>>,
    config: PipelineConfig,
}

impl StreamOrchestrator {
    pub fn new(
        metadata: Arc<dyn MetadataProvider>,
        indexers: IndexerSet,
        debrid: Arc<dyn DebridClient>,
        caches: Caches,
        config: PipelineConfig,
    ) -> Self {
        Self {
            metadata,
            indexers,
            debrid,
            caches,
            quota: None,
            config,
        }
    }

    /// Reschedule quota sweeps after every upload batch.
    pub fn with_quota_scheduler(mut self, scheduler: Arc<QuotaScheduler>) -> Self {
        self.quota = Some(scheduler);
        self
    }

    pub fn caches(&self) -> &Caches {
        &self.caches
    }

    /// Resolve a query into at most `preferences.output_cap` streams, best first.
    pub async fn resolve(&self, query: &MediaQuery, preferences: &Preferences) -> Vec<Stream> {
        let started = Instant::now();

        if query.kind == MediaKind::Series && query.episode_marker().is_none() {
            info!(
                external_id = %query.external_id,
                "Series query without season and episode, nothing to resolve"
            );
            return Vec::new();
        }
        if preferences.output_cap == 0 {
            return Vec::new();
        }

        let key = streams_key(query, preferences);
        if let Some(streams) = self.caches.streams.get(&key).await {
            debug!(
                external_id = %query.external_id,
                count = streams.len(),
                "Streams served from cache"
            );
            return streams;
        }

        let streams = self.assemble(query, preferences).await;

        STREAMS_RETURNED
            .with_label_values(&[query.kind.as_str()])
            .observe(streams.len() as f64);
        info!(
            external_id = %query.external_id,
            kind = query.kind.as_str(),
            count = streams.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Streams resolved"
        );

        if !streams.is_empty() {
            self.caches.streams.put(&key, &streams).await;
        }
        streams
    }

    async fn assemble(&self, query: &MediaQuery, preferences: &Preferences) -> Vec<Stream> {
        let Some(metadata) = self.lookup_metadata(query).await else {
            return Vec::new();
        };

        let raw = self.search_indexers(&metadata, query).await;
        if raw.is_empty() {
            info!(title = %metadata.primary_title, "No candidates found");
            return Vec::new();
        }

        let shortlist = self.shortlist(raw, query, preferences);
        if shortlist.is_empty() {
            info!(title = %metadata.primary_title, "No candidate matched the preferences");
            return Vec::new();
        }

        let resolved = self.resolve_hashes(shortlist).await;
        let magnets = self.ready_magnets(&resolved).await;
        if magnets.is_empty() {
            info!(title = %metadata.primary_title, "No ready magnet");
            return Vec::new();
        }

        self.unlock_streams(&metadata, query, &magnets, preferences.output_cap)
            .await
    }

    /// Metadata through the cache; unknown ids and failures yield `None`.
    async fn lookup_metadata(&self, query: &MediaQuery) -> Option<MediaMetadata> {
        if let Some(metadata) = self.caches.metadata.get(&query.external_id).await {
            return Some(metadata);
        }

        let started = Instant::now();
        let outcome = self
            .bounded(self.metadata.lookup(&query.external_id, query.kind), || {
                MetadataError::Timeout
            })
            .await;

        match outcome {
            Ok(Some(metadata)) => {
                record_external_call(self.metadata.name(), "lookup", "success", started);
                self.caches
                    .metadata
                    .put(&query.external_id, &metadata)
                    .await;
                Some(metadata)
            }
            Ok(None) => {
                record_external_call(self.metadata.name(), "lookup", "success", started);
                info!(external_id = %query.external_id, "Unknown external id");
                None
            }
            Err(e) => {
                let status = call_status(Some(e.is_timeout()));
                record_external_call(self.metadata.name(), "lookup", status, started);
                warn!(external_id = %query.external_id, error = %e, "Metadata lookup failed");
                None
            }
        }
    }

    /// Indexer fan-out through the cache. Empty results are not cached.
    async fn search_indexers(
        &self,
        metadata: &MediaMetadata,
        query: &MediaQuery,
    ) -> Vec<SourcedCandidate> {
        let request = SearchRequest {
            title: metadata.primary_title.clone(),
            kind: query.kind,
            season: query.season,
            episode: query.episode,
        };
        let key = indexer_results_key(&request.title, request.kind, request.season);
        let alternate = metadata.distinct_alternate();

        if let Some(bundle) = self.caches.indexer_results.get(&key).await {
            return bundle;
        }

        let bundle = self.indexers.search(&request, alternate).await;
        if !bundle.is_empty() {
            self.caches.indexer_results.put(&key, &bundle).await;
        }
        bundle
    }

    /// Classify, rank and merge candidates into the upload shortlist.
    ///
    /// Series order: complete series, complete season, episode. Candidates
    /// matching no preference list at all (only possible for ungated
    /// whole-series packs) go after every other candidate. Duplicates (same
    /// hash, or same indexer id) keep their first position. The list is
    /// capped at twice the output cap.
    fn shortlist(
        &self,
        mut raw: Vec<SourcedCandidate>,
        query: &MediaQuery,
        preferences: &Preferences,
    ) -> Vec<ClassifiedCandidate> {
        presort_by_seeders(&mut raw);

        let classified = classify(
            &raw,
            query,
            preferences,
            self.config.gate_complete_series,
        );
        debug!(
            complete_series = classified.complete_series.len(),
            complete_season = classified.complete_season.len(),
            episodes = classified.episodes.len(),
            movies = classified.movies.len(),
            "Candidates classified"
        );

        let mut groups = match query.kind {
            MediaKind::Movie => vec![classified.movies],
            MediaKind::Series => vec![
                classified.complete_series,
                classified.complete_season,
                classified.episodes,
            ],
        };

        let limit = preferences.output_cap.saturating_mul(2);
        let mut seen = HashSet::new();
        let mut shortlist = Vec::new();
        for group in groups.iter_mut() {
            rank(group, preferences);
            for candidate in group.drain(..) {
                let identity = match &candidate.candidate.info_hash {
                    Some(hash) => format!("hash:{}", hash.to_lowercase()),
                    None => format!("id:{}:{}", candidate.source, candidate.candidate.id),
                };
                if seen.insert(identity) {
                    shortlist.push(candidate);
                }
            }
        }

        shortlist.sort_by_cached_key(|c| matches_nothing(rank_key(&c.candidate, preferences)));
        shortlist.truncate(limit);
        shortlist
    }

    /// Fill in missing hashes from the originating indexer; unresolvable
    /// candidates are dropped. Order is preserved.
    async fn resolve_hashes(&self, shortlist: Vec<ClassifiedCandidate>) -> Vec<ResolvedCandidate> {
        let lookups = shortlist.into_iter().map(|c| async move {
            let hash = match c.candidate.info_hash {
                Some(hash) => Some(hash.to_lowercase()),
                None => self.indexers.resolve_hash(&c.source, &c.candidate.id).await,
            };
            match hash {
                Some(hash) => Some(ResolvedCandidate {
                    hash,
                    source: c.source,
                }),
                None => {
                    debug!(title = %c.candidate.title, "Dropping candidate without hash");
                    None
                }
            }
        });

        let mut seen = HashSet::new();
        join_all(lookups)
            .await
            .into_iter()
            .flatten()
            .filter(|c| seen.insert(c.hash.clone()))
            .collect()
    }

    /// Ready magnets in shortlist order.
    ///
    /// Hashes already cached as ready skip the upload; everything else goes
    /// out in one batch and the answers are written back.
    async fn ready_magnets(&self, resolved: &[ResolvedCandidate]) -> Vec<Magnet> {
        let mut known: HashMap<String, Magnet> = HashMap::new();
        let mut to_upload = Vec::new();

        for candidate in resolved {
            match self.caches.magnets.get(&candidate.hash).await {
                Some(magnet) if magnet.is_ready() => {
                    known.insert(candidate.hash.clone(), magnet);
                }
                _ => to_upload.push(MagnetRequest {
                    hash: candidate.hash.clone(),
                    source: candidate.source.clone(),
                }),
            }
        }

        if !to_upload.is_empty() {
            let started = Instant::now();
            let outcome = self
                .bounded(self.debrid.upload_magnets(&to_upload), || {
                    DebridError::Timeout
                })
                .await;

            match outcome {
                Ok(uploaded) => {
                    record_external_call(self.debrid.name(), "upload", "success", started);
                    debug!(
                        requested = to_upload.len(),
                        returned = uploaded.len(),
                        "Magnets uploaded"
                    );
                    for magnet in uploaded {
                        self.caches.magnets.put(&magnet.hash, &magnet).await;
                        known.insert(magnet.hash.clone(), magnet);
                    }
                    if let Some(scheduler) = &self.quota {
                        scheduler.schedule();
                    }
                }
                Err(e) => {
                    let status = call_status(Some(e.is_timeout()));
                    record_external_call(self.debrid.name(), "upload", status, started);
                    warn!(count = to_upload.len(), error = %e, "Magnet upload failed");
                }
            }
        }

        resolved
            .iter()
            .filter_map(|c| known.remove(&c.hash))
            .filter(|m| m.is_ready())
            .collect()
    }

    /// Walk ready magnets in order, unlocking matching files until `cap`.
    /// No call is issued once the cap is reached.
    async fn unlock_streams(
        &self,
        metadata: &MediaMetadata,
        query: &MediaQuery,
        magnets: &[Magnet],
        cap: usize,
    ) -> Vec<Stream> {
        let marker = query.episode_marker();
        let mut streams = Vec::new();

        for magnet in magnets {
            if streams.len() >= cap {
                break;
            }

            let files = select_video_files(self.file_listing(magnet).await);
            let files: Vec<_> = match &marker {
                Some(marker) => files
                    .into_iter()
                    .filter(|f| marker.matches(&f.name))
                    .collect(),
                None => files,
            };
            debug!(hash = %magnet.hash, count = files.len(), "Files selected");

            for file in files {
                if streams.len() >= cap {
                    break;
                }

                let started = Instant::now();
                let outcome = self
                    .bounded(self.debrid.unlock(&file.link), || DebridError::Timeout)
                    .await;

                match outcome {
                    Ok(url) => {
                        record_external_call(self.debrid.name(), "unlock", "success", started);
                        debug!(file = %file.name, "Unlocked");
                        streams.push(build_stream(metadata, query, magnet, &file, url));
                    }
                    Err(e) => {
                        let status = call_status(Some(e.is_timeout()));
                        record_external_call(self.debrid.name(), "unlock", status, started);
                        UNLOCK_FAILURES.inc();
                        warn!(file = %file.name, error = %e, "Unlock failed, skipping file");
                    }
                }
            }
        }

        streams
    }

    /// File listing through the cache. Empty listings are not cached.
    async fn file_listing(&self, magnet: &Magnet) -> Vec<VideoFile> {
        let listing = self
            .caches
            .file_listings
            .read_through_when(
                &magnet.hash,
                |files: &Vec<VideoFile>| !files.is_empty(),
                || async {
                    let started = Instant::now();
                    let outcome = self
                        .bounded(self.debrid.list_files(magnet.remote_id), || {
                            DebridError::Timeout
                        })
                        .await;
                    let status =
                        call_status(outcome.as_ref().err().map(DebridError::is_timeout));
                    record_external_call(self.debrid.name(), "list_files", status, started);
                    outcome
                },
            )
            .await;

        listing.unwrap_or_else(|e| {
            warn!(hash = %magnet.hash, error = %e, "File listing failed");
            Vec::new()
        })
    }

    async fn bounded<T, E>(
        &self,
        call: impl Future<Output = Result<T, E>>,
        on_timeout: impl FnOnce() -> E,
    ) -> Result<T, E> {
        let timeout: Duration = self.config.upstream_timeout();
        match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(on_timeout()),
        }
    }
}

/// Metric status label for a call outcome; `None` means success.
fn call_status(timed_out: Option<bool>) -> &'static str {
    match timed_out {
        None => "success",
        Some(true) => "timeout",
        Some(false) => "error",
    }
}
