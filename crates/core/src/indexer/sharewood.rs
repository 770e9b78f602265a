//! Sharewood passkey API client.
//!
//! Results come with the info hash and a language tag inline.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{Indexer, IndexerError, RawCandidate, SearchRequest};
use crate::config::SharewoodConfig;
use crate::media::{EpisodeMarker, MediaKind};

const DEFAULT_BASE_URL: &str = "https://www.sharewood.tv";

/// Video category id.
const VIDEO_CATEGORY: &str = "1";

/// Sharewood API client.
pub struct SharewoodClient {
    client: Client,
    base_url: String,
    passkey: String,
}

#[derive(Debug, Deserialize)]
struct SharewoodTorrent {
    id: u64,
    name: String,
    #[serde(default)]
    info_hash: Option<String>,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    seeders: Option<i64>,
    #[serde(default)]
    language: Option<String>,
}

impl SharewoodClient {
    pub fn new(config: &SharewoodConfig, timeout: Duration) -> Result<Self, IndexerError> {
        if config.passkey.trim().is_empty() {
            return Err(IndexerError::Internal(
                "Sharewood passkey is required".to_string(),
            ));
        }

        let client = Client::builder().timeout(timeout).build()?;
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            passkey: config.passkey.clone(),
        })
    }

    fn subcategories(kind: MediaKind) -> &'static [&'static str] {
        match kind {
            MediaKind::Movie => &["9", "11"],
            MediaKind::Series => &["10", "12"],
        }
    }

    /// Series searches name the season so the indexer narrows the result set.
    fn search_name(request: &SearchRequest) -> String {
        match (request.kind, request.season) {
            (MediaKind::Series, Some(season)) => format!(
                "{} {}",
                request.title,
                EpisodeMarker::season_token(season).to_uppercase()
            ),
            _ => request.title.clone(),
        }
    }
}

#[async_trait]
impl Indexer for SharewoodClient {
    fn name(&self) -> &str {
        "sharewood"
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<RawCandidate>, IndexerError> {
        let url = format!(
            "{}/api/{}/search",
            self.base_url,
            urlencoding::encode(&self.passkey)
        );
        let name = Self::search_name(request);
        debug!(indexer = "sharewood", name = %name, "Searching");

        let mut params: Vec<(&str, &str)> =
            vec![("name", name.as_str()), ("category", VIDEO_CATEGORY)];
        for subcategory in Self::subcategories(request.kind) {
            params.push(("subcategory_id", *subcategory));
        }

        let response = self.client.get(&url).query(&params).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IndexerError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let torrents: Vec<SharewoodTorrent> = response
            .json()
            .await
            .map_err(|e| IndexerError::Parse(format!("Failed to parse search response: {}", e)))?;

        Ok(torrents
            .into_iter()
            .map(|t| RawCandidate {
                id: t.id.to_string(),
                title: t.name,
                size_bytes: t.size.unwrap_or(0),
                seeders: t.seeders.unwrap_or(0).clamp(0, u32::MAX as i64) as u32,
                language: t.language.filter(|l| !l.trim().is_empty()),
                info_hash: t
                    .info_hash
                    .map(|h| h.trim().to_lowercase())
                    .filter(|h| !h.is_empty()),
            })
            .collect())
    }

    async fn resolve_hash(&self, _id: &str) -> Result<Option<String>, IndexerError> {
        // Hashes are returned with every search result.
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(kind: MediaKind, season: Option<u32>) -> SearchRequest {
        SearchRequest {
            title: "The Office".to_string(),
            kind,
            season,
            episode: None,
        }
    }

    #[test]
    fn test_search_name_appends_season() {
        assert_eq!(
            SharewoodClient::search_name(&request(MediaKind::Series, Some(3))),
            "The Office S03"
        );
        assert_eq!(
            SharewoodClient::search_name(&request(MediaKind::Series, None)),
            "The Office"
        );
        assert_eq!(
            SharewoodClient::search_name(&request(MediaKind::Movie, Some(3))),
            "The Office"
        );
    }

    #[test]
    fn test_subcategories_by_kind() {
        assert_eq!(SharewoodClient::subcategories(MediaKind::Movie), &["9", "11"]);
        assert_eq!(SharewoodClient::subcategories(MediaKind::Series), &["10", "12"]);
    }

    #[test]
    fn test_parse_search_payload() {
        let json = r#"[{
            "id": 5, "name": "The Office S03 MULTI 1080p x264", "info_hash": "ABC",
            "size": 1000, "seeders": 12, "leechers": 1, "language": "MULTI", "type": "Série"
        }]"#;
        let torrents: Vec<SharewoodTorrent> = serde_json::from_str(json).unwrap();
        assert_eq!(torrents[0].info_hash.as_deref(), Some("ABC"));
        assert_eq!(torrents[0].language.as_deref(), Some("MULTI"));
    }

    #[test]
    fn test_requires_passkey() {
        let config = SharewoodConfig {
            passkey: " ".to_string(),
            base_url: None,
        };
        assert!(SharewoodClient::new(&config, Duration::from_secs(1)).is_err());
    }
}
