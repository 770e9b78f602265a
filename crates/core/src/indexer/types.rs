//! Types for the torrent indexer clients.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::media::MediaKind;

/// One search hit as reported by an indexer, before classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCandidate {
    /// Indexer-internal id, used for the hash lookup.
    pub id: String,
    /// Release title.
    pub title: String,
    /// Size in bytes.
    pub size_bytes: u64,
    pub seeders: u32,
    /// Language tag when the indexer reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Content hash (lowercase hex) when the indexer returns it inline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info_hash: Option<String>,
}

impl RawCandidate {
    /// Text the preference tokens are matched against: title plus language tag.
    pub fn match_text(&self) -> String {
        match &self.language {
            Some(language) => format!("{} {}", self.title, language).to_lowercase(),
            None => self.title.to_lowercase(),
        }
    }
}

/// A raw candidate tagged with the indexer that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcedCandidate {
    pub source: String,
    pub candidate: RawCandidate,
}

/// Parameters of one indexer search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Free-text title.
    pub title: String,
    pub kind: MediaKind,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

impl SearchRequest {
    /// The same request for a different title.
    pub fn with_title(&self, title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..self.clone()
        }
    }
}

/// Errors that can occur talking to an indexer.
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("Indexer connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Indexer API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse indexer response: {0}")]
    Parse(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IndexerError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, IndexerError::Timeout)
    }
}

impl From<reqwest::Error> for IndexerError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            IndexerError::Timeout
        } else if e.is_connect() {
            IndexerError::ConnectionFailed(e.to_string())
        } else if e.is_decode() {
            IndexerError::Parse(e.to_string())
        } else if e.is_builder() {
            IndexerError::Internal(e.to_string())
        } else {
            IndexerError::Api {
                status: e.status().map(|s| s.as_u16()).unwrap_or(0),
                message: e.to_string(),
            }
        }
    }
}

/// A torrent indexer.
#[async_trait]
pub trait Indexer: Send + Sync {
    /// Indexer name for logging and candidate tagging.
    fn name(&self) -> &str;

    /// Search by title. One request per call; no retries.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<RawCandidate>, IndexerError>;

    /// Look up the content hash of a result by its indexer id.
    async fn resolve_hash(&self, id: &str) -> Result<Option<String>, IndexerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_text_includes_language() {
        let mut candidate = RawCandidate {
            id: "1".to_string(),
            title: "Movie 1080p x264".to_string(),
            size_bytes: 0,
            seeders: 0,
            language: Some("FRENCH".to_string()),
            info_hash: None,
        };
        assert_eq!(candidate.match_text(), "movie 1080p x264 french");

        candidate.language = None;
        assert_eq!(candidate.match_text(), "movie 1080p x264");
    }

    #[test]
    fn test_raw_candidate_minimal_json() {
        let json = r#"{"id": "9", "title": "T", "size_bytes": 1, "seeders": 2}"#;
        let parsed: RawCandidate = serde_json::from_str(json).unwrap();
        assert!(parsed.language.is_none());
        assert!(parsed.info_hash.is_none());
    }
}
