//! Preference ranking.
//!
//! Order is lexicographic over (language, resolution, codec), each rank being
//! the index of the first preference token found in the candidate text.
//! Unmatched lists rank after every concrete index; ties keep arrival order.

use crate::indexer::{RawCandidate, SourcedCandidate};
use crate::media::Preferences;

use super::ClassifiedCandidate;

/// Rank used when no token of a list matches.
pub const UNMATCHED: usize = usize::MAX;

/// Sort key of a candidate; lower sorts first.
pub type RankKey = (usize, usize, usize);

/// Index of the first token of `tokens` contained in `text` (case-insensitive).
pub fn preference_rank(text: &str, tokens: &[String]) -> Option<usize> {
    let text = text.to_lowercase();
    tokens
        .iter()
        .position(|token| text.contains(&token.to_lowercase()))
}

pub fn rank_key(candidate: &RawCandidate, preferences: &Preferences) -> RankKey {
    let language = preference_rank(&candidate.match_text(), &preferences.languages);
    let resolution = preference_rank(&candidate.title, &preferences.resolutions);
    let codec = preference_rank(&candidate.title, &preferences.codecs);

    (
        language.unwrap_or(UNMATCHED),
        resolution.unwrap_or(UNMATCHED),
        codec.unwrap_or(UNMATCHED),
    )
}

/// No preference list matched at all.
pub fn matches_nothing(key: RankKey) -> bool {
    key == (UNMATCHED, UNMATCHED, UNMATCHED)
}

/// Stable in-place ranking.
pub fn rank(candidates: &mut [ClassifiedCandidate], preferences: &Preferences) {
    candidates.sort_by_cached_key(|c| rank_key(&c.candidate, preferences));
}

/// Coarse pre-sort by seeders, most seeded first. Applied before dedup and ranking.
pub fn presort_by_seeders(candidates: &mut [SourcedCandidate]) {
    candidates.sort_by(|a, b| b.candidate.seeders.cmp(&a.candidate.seeders));
}
