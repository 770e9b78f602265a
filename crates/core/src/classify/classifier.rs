//! Candidate classification by title markers and preference gating.

use serde::{Deserialize, Serialize};

use crate::indexer::{RawCandidate, SourcedCandidate};
use crate::media::{EpisodeMarker, MediaKind, MediaQuery, Preferences};

/// Marker word identifying whole-series packs.
const COMPLETE_MARKER: &str = "complete";

/// Collection a candidate was admitted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateCategory {
    CompleteSeries,
    CompleteSeason,
    Episode,
    Movie,
}

impl CandidateCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateCategory::CompleteSeries => "complete_series",
            CandidateCategory::CompleteSeason => "complete_season",
            CandidateCategory::Episode => "episode",
            CandidateCategory::Movie => "movie",
        }
    }
}

/// A raw candidate admitted to one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedCandidate {
    pub source: String,
    pub candidate: RawCandidate,
    pub category: CandidateCategory,
}

/// Output of [`classify`]. A candidate may appear in several collections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedResults {
    pub complete_series: Vec<ClassifiedCandidate>,
    pub complete_season: Vec<ClassifiedCandidate>,
    pub episodes: Vec<ClassifiedCandidate>,
    pub movies: Vec<ClassifiedCandidate>,
}

impl ClassifiedResults {
    pub fn is_empty(&self) -> bool {
        self.complete_series.is_empty()
            && self.complete_season.is_empty()
            && self.episodes.is_empty()
            && self.movies.is_empty()
    }

    pub fn len(&self) -> usize {
        self.complete_series.len()
            + self.complete_season.len()
            + self.episodes.len()
            + self.movies.len()
    }
}

/// Title names a whole series pack.
pub fn is_complete_series(title: &str) -> bool {
    title.to_lowercase().contains(COMPLETE_MARKER)
}

/// Title names `season` but no single episode of it.
pub fn is_complete_season(title: &str, season: u32) -> bool {
    title
        .to_lowercase()
        .contains(&EpisodeMarker::season_token(season))
        && !EpisodeMarker::names_episode_of_season(title, season)
}

/// Title names exactly this episode.
pub fn is_episode(title: &str, marker: &EpisodeMarker) -> bool {
    marker.matches(title)
}

/// The candidate carries a token from every preference list.
///
/// An empty list matches nothing, so it rejects every candidate.
///
/// Resolution and codec are read from the title; language also accepts the
/// indexer's language tag.
pub fn matches_preferences(candidate: &RawCandidate, preferences: &Preferences) -> bool {
    let title = candidate.title.to_lowercase();
    let language_text = candidate.match_text();

    contains_any(&title, &preferences.resolutions)
        && contains_any(&language_text, &preferences.languages)
        && contains_any(&title, &preferences.codecs)
}

fn contains_any(text: &str, tokens: &[String]) -> bool {
    tokens
        .iter()
        .any(|token| text.contains(&token.to_lowercase()))
}

/// Partition candidates into the collections relevant to `query`.
///
/// Each collection is decided by its own predicate. Candidates matching none
/// are dropped. With `gate_complete_series` off, whole-series packs skip the
/// preference check.
pub fn classify(
    candidates: &[SourcedCandidate],
    query: &MediaQuery,
    preferences: &Preferences,
    gate_complete_series: bool,
) -> ClassifiedResults {
    let mut results = ClassifiedResults::default();
    let marker = query.episode_marker();

    for sourced in candidates {
        let title = &sourced.candidate.title;
        let preferred = matches_preferences(&sourced.candidate, preferences);
        let admit = |category| ClassifiedCandidate {
            source: sourced.source.clone(),
            candidate: sourced.candidate.clone(),
            category,
        };

        match query.kind {
            MediaKind::Movie => {
                if preferred {
                    results.movies.push(admit(CandidateCategory::Movie));
                }
            }
            MediaKind::Series => {
                if (preferred || !gate_complete_series) && is_complete_series(title) {
                    results
                        .complete_series
                        .push(admit(CandidateCategory::CompleteSeries));
                }
                if !preferred {
                    continue;
                }
                if let Some(season) = query.season {
                    if is_complete_season(title, season) {
                        results
                            .complete_season
                            .push(admit(CandidateCategory::CompleteSeason));
                    }
                }
                if let Some(marker) = &marker {
                    if is_episode(title, marker) {
                        results.episodes.push(admit(CandidateCategory::Episode));
                    }
                }
            }
        }
    }

    results
}
