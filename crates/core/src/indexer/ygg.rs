//! Ygg API indexer client.
//!
//! Search results carry no info hash; it is fetched per torrent on demand.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::{Indexer, IndexerError, RawCandidate, SearchRequest};
use crate::config::YggConfig;

const DEFAULT_BASE_URL: &str = "https://yggapi.eu";

/// Ygg API client.
pub struct YggClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct YggTorrent {
    id: u64,
    title: String,
    #[serde(default)]
    seeders: Option<i64>,
    #[serde(default)]
    size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct YggTorrentDetails {
    #[serde(default)]
    hash: Option<String>,
}

impl YggClient {
    pub fn new(config: &YggConfig, timeout: Duration) -> Result<Self, IndexerError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Indexer for YggClient {
    fn name(&self) -> &str {
        "ygg"
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<RawCandidate>, IndexerError> {
        let url = format!("{}/torrents", self.base_url);
        debug!(indexer = "ygg", title = %request.title, "Searching");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", request.title.as_str()),
                ("page", "1"),
                ("per_page", "100"),
                ("order_by", "uploaded_at"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IndexerError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let torrents: Vec<YggTorrent> = response
            .json()
            .await
            .map_err(|e| IndexerError::Parse(format!("Failed to parse search response: {}", e)))?;

        Ok(torrents
            .into_iter()
            .map(|t| RawCandidate {
                id: t.id.to_string(),
                title: t.title,
                size_bytes: t.size.unwrap_or(0),
                seeders: t.seeders.unwrap_or(0).clamp(0, u32::MAX as i64) as u32,
                language: None,
                info_hash: None,
            })
            .collect())
    }

    async fn resolve_hash(&self, id: &str) -> Result<Option<String>, IndexerError> {
        let url = format!("{}/torrent/{}", self.base_url, urlencoding::encode(id));
        debug!(indexer = "ygg", id, "Fetching info hash");

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IndexerError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let details: YggTorrentDetails = response
            .json()
            .await
            .map_err(|e| IndexerError::Parse(format!("Failed to parse torrent details: {}", e)))?;

        Ok(details
            .hash
            .map(|h| h.trim().to_lowercase())
            .filter(|h| !h.is_empty()))
    }
}
