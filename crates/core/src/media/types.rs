//! Types shared by every stage of the stream pipeline.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::EpisodeMarker;

/// Kind of media being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Movie,
    Series,
}

impl MediaKind {
    /// Returns the string representation used in routes and cache keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "series",
        }
    }
}

impl std::str::FromStr for MediaKind {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "movie" => Ok(MediaKind::Movie),
            "series" => Ok(MediaKind::Series),
            other => Err(QueryError::UnsupportedKind(other.to_string())),
        }
    }
}

/// Errors building a [`MediaQuery`] from caller input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("Unsupported media type: {0}")]
    UnsupportedKind(String),

    #[error("Empty content identifier")]
    EmptyId,

    #[error("Invalid season/episode number: {0}")]
    InvalidNumber(String),
}

/// A single stream request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaQuery {
    /// External content id (an IMDB id such as `tt0903747`).
    pub external_id: String,
    /// Kind requested by the caller.
    pub kind: MediaKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
}

impl MediaQuery {
    pub fn movie(external_id: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            kind: MediaKind::Movie,
            season: None,
            episode: None,
        }
    }

    pub fn episode(external_id: impl Into<String>, season: u32, episode: u32) -> Self {
        Self {
            external_id: external_id.into(),
            kind: MediaKind::Series,
            season: Some(season),
            episode: Some(episode),
        }
    }

    /// Parse an addon-style id: `tt123` or `tt123:<season>:<episode>`.
    pub fn parse(kind: MediaKind, id: &str) -> Result<Self, QueryError> {
        let mut parts = id.split(':');
        let external_id = parts.next().unwrap_or_default().trim();
        if external_id.is_empty() {
            return Err(QueryError::EmptyId);
        }

        let number = |part: Option<&str>| -> Result<Option<u32>, QueryError> {
            match part {
                None | Some("") => Ok(None),
                Some(raw) => raw
                    .parse::<u32>()
                    .map(Some)
                    .map_err(|_| QueryError::InvalidNumber(raw.to_string())),
            }
        };
        let season = number(parts.next())?;
        let episode = number(parts.next())?;

        Ok(Self {
            external_id: external_id.to_string(),
            kind,
            season,
            episode,
        })
    }

    /// The `SxxEyy` marker for series queries that name both numbers.
    pub fn episode_marker(&self) -> Option<EpisodeMarker> {
        match (self.kind, self.season, self.episode) {
            (MediaKind::Series, Some(season), Some(episode)) => {
                Some(EpisodeMarker::new(season, episode))
            }
            _ => None,
        }
    }

    /// Key identifying this exact request in the streams cache.
    pub fn cache_key(&self) -> String {
        let mut key = format!("{}:{}", self.kind.as_str(), self.external_id);
        if let Some(season) = self.season {
            key.push_str(&format!(":{}", season));
        }
        if let Some(episode) = self.episode {
            key.push_str(&format!(":{}", episode));
        }
        key
    }
}

/// Metadata resolved once per external id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub external_id: String,
    pub kind: MediaKind,
    /// Display title (English on TMDB).
    pub primary_title: String,
    /// Original-language title, used for the retry search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_title: Option<String>,
}

impl MediaMetadata {
    /// The alternate title when it exists and differs from the primary one.
    pub fn distinct_alternate(&self) -> Option<&str> {
        self.alternate_title
            .as_deref()
            .map(str::trim)
            .filter(|alt| !alt.is_empty() && !alt.eq_ignore_ascii_case(self.primary_title.trim()))
    }
}

/// User-declared preferences; order inside each list is priority order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default = "default_resolutions")]
    pub resolutions: Vec<String>,
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    #[serde(default = "default_codecs")]
    pub codecs: Vec<String>,
    /// Maximum number of streams returned for one query.
    #[serde(default = "default_output_cap")]
    pub output_cap: usize,
}

fn default_output_cap() -> usize {
    5
}

fn default_resolutions() -> Vec<String> {
    vec!["1080p".to_string(), "720p".to_string(), "4k".to_string()]
}

fn default_languages() -> Vec<String> {
    vec!["MULTI".to_string(), "FRENCH".to_string(), "VOSTFR".to_string()]
}

fn default_codecs() -> Vec<String> {
    vec!["x264".to_string(), "x265".to_string(), "h264".to_string()]
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            resolutions: default_resolutions(),
            languages: default_languages(),
            codecs: default_codecs(),
            output_cap: default_output_cap(),
        }
    }
}

impl Preferences {
    /// Hex SHA-256 over the preference lists and cap, stable across runs.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for list in [&self.resolutions, &self.languages, &self.codecs] {
            for token in list.iter() {
                hasher.update(token.to_lowercase().as_bytes());
                hasher.update([0x1f]);
            }
            hasher.update([0x1e]);
        }
        hasher.update(self.output_cap.to_le_bytes());
        let digest = format!("{:x}", hasher.finalize());
        digest[..16].to_string()
    }
}

/// A ready-to-play stream descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stream {
    /// Short label (`<source> + AD | <resolution> | <codec>`).
    pub name: String,
    /// Multi-line description.
    pub title: String,
    /// Direct playable URL.
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_movie_id() {
        let query = MediaQuery::parse(MediaKind::Movie, "tt0111161").unwrap();
        assert_eq!(query, MediaQuery::movie("tt0111161"));
        assert!(query.episode_marker().is_none());
    }

    #[test]
    fn test_parse_series_id() {
        let query = MediaQuery::parse(MediaKind::Series, "tt0903747:1:2").unwrap();
        assert_eq!(query.season, Some(1));
        assert_eq!(query.episode, Some(2));
        assert_eq!(query.episode_marker().unwrap().to_string(), "S01E02");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(
            MediaQuery::parse(MediaKind::Series, "tt1:x:2"),
            Err(QueryError::InvalidNumber("x".to_string()))
        );
        assert_eq!(MediaQuery::parse(MediaKind::Movie, ""), Err(QueryError::EmptyId));
    }

    #[test]
    fn test_media_kind_from_str() {
        assert_eq!("Movie".parse::<MediaKind>().unwrap(), MediaKind::Movie);
        assert_eq!("series".parse::<MediaKind>().unwrap(), MediaKind::Series);
        assert!("channel".parse::<MediaKind>().is_err());
    }

    #[test]
    fn test_cache_key_includes_episode() {
        assert_eq!(MediaQuery::movie("tt1").cache_key(), "movie:tt1");
        assert_eq!(MediaQuery::episode("tt2", 3, 4).cache_key(), "series:tt2:3:4");
    }

    #[test]
    fn test_distinct_alternate() {
        let mut metadata = MediaMetadata {
            external_id: "tt1".to_string(),
            kind: MediaKind::Movie,
            primary_title: "Amelie".to_string(),
            alternate_title: Some("amelie".to_string()),
        };
        assert!(metadata.distinct_alternate().is_none());

        metadata.alternate_title = Some("Le Fabuleux Destin d'Amélie Poulain".to_string());
        assert_eq!(
            metadata.distinct_alternate(),
            Some("Le Fabuleux Destin d'Amélie Poulain")
        );

        metadata.alternate_title = Some("  ".to_string());
        assert!(metadata.distinct_alternate().is_none());
    }

    #[test]
    fn test_fingerprint_tracks_preferences() {
        let prefs = Preferences::default();
        let mut other = prefs.clone();
        assert_eq!(prefs.fingerprint(), other.fingerprint());

        other.codecs.reverse();
        assert_ne!(prefs.fingerprint(), other.fingerprint());

        let mut capped = prefs.clone();
        capped.output_cap = 1;
        assert_ne!(prefs.fingerprint(), capped.fingerprint());
    }

    #[test]
    fn test_preferences_deserialize_defaults_cap() {
        let prefs: Preferences =
            serde_json::from_str(r#"{"resolutions": ["1080p"], "languages": [], "codecs": []}"#)
                .unwrap();
        assert_eq!(prefs.output_cap, 5);
        assert_eq!(prefs.resolutions, vec!["1080p"]);
    }
}
