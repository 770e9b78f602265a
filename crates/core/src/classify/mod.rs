//! Candidate classification and preference ranking.

mod classifier;
mod ranker;

pub use classifier::{
    classify, is_complete_season, is_complete_series, is_episode, matches_preferences,
    CandidateCategory, ClassifiedCandidate, ClassifiedResults,
};
pub use ranker::{
    matches_nothing, preference_rank, presort_by_seeders, rank, rank_key, RankKey, UNMATCHED,
};
