//! TMDB (The Movie Database) API client.
//!
//! Resolves IMDB ids through the `/find` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::{MetadataError, MetadataProvider};
use crate::config::TmdbConfig;
use crate::media::{MediaKind, MediaMetadata};

const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

/// TMDB API client.
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct FindResponse {
    #[serde(default)]
    movie_results: Vec<FindMovie>,
    #[serde(default)]
    tv_results: Vec<FindTv>,
}

#[derive(Debug, Deserialize)]
struct FindMovie {
    title: String,
    #[serde(default)]
    original_title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FindTv {
    name: String,
    #[serde(default)]
    original_name: Option<String>,
}

impl TmdbClient {
    /// Create a new TMDB client.
    pub fn new(config: &TmdbConfig, timeout: Duration) -> Result<Self, MetadataError> {
        if config.api_key.is_empty() {
            return Err(MetadataError::NotConfigured(
                "TMDB API key is required".to_string(),
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
            api_key: config.api_key.clone(),
        })
    }

    /// Movie results win over TV results.
    fn pick(external_id: &str, found: FindResponse) -> Option<MediaMetadata> {
        if let Some(movie) = found.movie_results.into_iter().next() {
            return Some(MediaMetadata {
                external_id: external_id.to_string(),
                kind: MediaKind::Movie,
                primary_title: movie.title,
                alternate_title: movie.original_title,
            });
        }

        found.tv_results.into_iter().next().map(|tv| MediaMetadata {
            external_id: external_id.to_string(),
            kind: MediaKind::Series,
            primary_title: tv.name,
            alternate_title: tv.original_name,
        })
    }
}

#[async_trait]
impl MetadataProvider for TmdbClient {
    fn name(&self) -> &str {
        "tmdb"
    }

    async fn lookup(
        &self,
        external_id: &str,
        kind: MediaKind,
    ) -> Result<Option<MediaMetadata>, MetadataError> {
        let url = format!(
            "{}/find/{}",
            self.base_url,
            urlencoding::encode(external_id)
        );

        debug!(external_id, kind = kind.as_str(), "TMDB find");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("external_source", "imdb_id"),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(MetadataError::NotConfigured(
                "Invalid TMDB API key".to_string(),
            ));
        }
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MetadataError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let found: FindResponse = response.json().await.map_err(|e| {
            MetadataError::Parse(format!("Failed to parse find response: {}", e))
        })?;

        Ok(Self::pick(external_id, found))
    }
}
