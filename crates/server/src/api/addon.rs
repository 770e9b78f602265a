//! Stremio addon routes: manifest and stream lookup.
//!
//! The caller's preferences travel in the first path segment as base64
//! encoded JSON (`RES_TO_SHOW`, `LANG_TO_SHOW`, `CODECS_TO_SHOW`,
//! `FILES_TO_SHOW`). Missing fields fall back to the server defaults.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use relaystream_core::{MediaKind, MediaQuery, Preferences, Stream};

use crate::metrics::STREAM_REQUESTS_TOTAL;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Preferences as encoded in the addon URL.
#[derive(Debug, Default, Deserialize)]
pub struct AddonConfig {
    #[serde(rename = "RES_TO_SHOW", default)]
    pub resolutions: Option<Vec<String>>,
    #[serde(rename = "LANG_TO_SHOW", default)]
    pub languages: Option<Vec<String>>,
    #[serde(rename = "CODECS_TO_SHOW", default)]
    pub codecs: Option<Vec<String>>,
    #[serde(rename = "FILES_TO_SHOW", default)]
    pub files_to_show: Option<FileCount>,
}

/// `FILES_TO_SHOW` is a number, or a numeric string when it comes from a form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FileCount {
    Number(usize),
    Text(String),
}

impl AddonConfig {
    /// Decode the config path segment.
    pub fn decode(segment: &str) -> Result<Self, String> {
        let trimmed = segment.trim().trim_end_matches('=');
        let bytes = STANDARD_NO_PAD
            .decode(trimmed)
            .or_else(|_| URL_SAFE_NO_PAD.decode(trimmed))
            .map_err(|_| "Invalid configuration in URL".to_string())?;
        serde_json::from_slice(&bytes).map_err(|_| "Invalid configuration in URL".to_string())
    }

    /// Merge with the server defaults.
    pub fn into_preferences(self, defaults: &Preferences) -> Result<Preferences, String> {
        let output_cap = match self.files_to_show {
            None => defaults.output_cap,
            Some(FileCount::Number(n)) => n,
            Some(FileCount::Text(raw)) => raw
                .trim()
                .parse()
                .map_err(|_| format!("Invalid FILES_TO_SHOW: {}", raw))?,
        };

        Ok(Preferences {
            resolutions: self
                .resolutions
                .unwrap_or_else(|| defaults.resolutions.clone()),
            languages: self
                .languages
                .unwrap_or_else(|| defaults.languages.clone()),
            codecs: self.codecs.unwrap_or_else(|| defaults.codecs.clone()),
            output_cap,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorHints {
    pub configurable: bool,
    pub configuration_required: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub id: &'static str,
    pub version: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub types: Vec<&'static str>,
    pub resources: Vec<&'static str>,
    pub catalogs: Vec<serde_json::Value>,
    pub behavior_hints: BehaviorHints,
}

impl Manifest {
    fn new(configuration_required: bool) -> Self {
        Self {
            id: "relaystream.stremio.ad",
            version: env!("CARGO_PKG_VERSION"),
            name: "Relaystream + AD",
            description: "Torrents from Ygg and Sharewood, streamed through AllDebrid.",
            types: vec![MediaKind::Movie.as_str(), MediaKind::Series.as_str()],
            resources: vec!["stream"],
            catalogs: Vec::new(),
            behavior_hints: BehaviorHints {
                configurable: true,
                configuration_required,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StreamsResponse {
    pub streams: Vec<Stream>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(error: String) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error }))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /manifest.json
///
/// Manifest for an addon that has not been configured yet.
pub async fn manifest() -> Json<Manifest> {
    Json(Manifest::new(true))
}

/// GET /{config}/manifest.json
pub async fn configured_manifest(Path(config): Path<String>) -> Result<Json<Manifest>, ApiError> {
    AddonConfig::decode(&config).map_err(bad_request)?;
    Ok(Json(Manifest::new(false)))
}

/// GET /{config}/stream/{type}/{id}.json
///
/// Resolves the id into unlocked streams. Anything that prevents resolution
/// besides a bad config yields an empty list.
pub async fn streams(
    State(state): State<Arc<AppState>>,
    Path((config, kind, id)): Path<(String, String, String)>,
) -> Result<Json<StreamsResponse>, ApiError> {
    let preferences = match AddonConfig::decode(&config)
        .and_then(|c| c.into_preferences(state.default_preferences()))
    {
        Ok(preferences) => preferences,
        Err(e) => {
            STREAM_REQUESTS_TOTAL
                .with_label_values(&[kind.as_str(), "invalid_config"])
                .inc();
            return Err(bad_request(e));
        }
    };

    let id = id.strip_suffix(".json").unwrap_or(&id);
    let query = match kind.parse::<MediaKind>().and_then(|k| MediaQuery::parse(k, id)) {
        Ok(query) => query,
        Err(e) => {
            warn!(kind = %kind, id, error = %e, "Rejected stream request");
            STREAM_REQUESTS_TOTAL
                .with_label_values(&[kind.as_str(), "invalid_id"])
                .inc();
            return Ok(Json(StreamsResponse {
                streams: Vec::new(),
            }));
        }
    };

    info!(external_id = %query.external_id, kind = query.kind.as_str(), "Stream request");
    debug!(?preferences, "Effective preferences");

    let streams = state.orchestrator().resolve(&query, &preferences).await;
    let outcome = if streams.is_empty() { "empty" } else { "served" };
    STREAM_REQUESTS_TOTAL
        .with_label_values(&[query.kind.as_str(), outcome])
        .inc();

    Ok(Json(StreamsResponse { streams }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;

    fn encode(json: &str) -> String {
        STANDARD.encode(json.as_bytes())
    }

    #[test]
    fn test_decode_full_config() {
        let segment = encode(
            r#"{"RES_TO_SHOW":["1080p"],"LANG_TO_SHOW":["MULTI"],"CODECS_TO_SHOW":["x265"],"FILES_TO_SHOW":3}"#,
        );
        let prefs = AddonConfig::decode(&segment)
            .unwrap()
            .into_preferences(&Preferences::default())
            .unwrap();

        assert_eq!(prefs.resolutions, vec!["1080p"]);
        assert_eq!(prefs.languages, vec!["MULTI"]);
        assert_eq!(prefs.codecs, vec!["x265"]);
        assert_eq!(prefs.output_cap, 3);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let defaults = Preferences::default();
        let prefs = AddonConfig::decode(&encode(r#"{"TMDB_API_KEY":"ignored"}"#))
            .unwrap()
            .into_preferences(&defaults)
            .unwrap();
        assert_eq!(prefs, defaults);
    }

    #[test]
    fn test_explicit_empty_list_is_kept() {
        let prefs = AddonConfig::decode(&encode(r#"{"CODECS_TO_SHOW":[]}"#))
            .unwrap()
            .into_preferences(&Preferences::default())
            .unwrap();
        assert!(prefs.codecs.is_empty());
        assert_eq!(prefs.resolutions, Preferences::default().resolutions);
    }

    #[test]
    fn test_files_to_show_as_string() {
        let prefs = AddonConfig::decode(&encode(r#"{"FILES_TO_SHOW":"7"}"#))
            .unwrap()
            .into_preferences(&Preferences::default())
            .unwrap();
        assert_eq!(prefs.output_cap, 7);

        let bad = AddonConfig::decode(&encode(r#"{"FILES_TO_SHOW":"many"}"#))
            .unwrap()
            .into_preferences(&Preferences::default());
        assert!(bad.is_err());
    }

    #[test]
    fn test_unpadded_and_url_safe_segments() {
        let json = r#"{"RES_TO_SHOW":["4k"]}"#;
        let unpadded = STANDARD_NO_PAD.encode(json);
        let url_safe = URL_SAFE_NO_PAD.encode(json);
        assert!(AddonConfig::decode(&unpadded).is_ok());
        assert!(AddonConfig::decode(&url_safe).is_ok());
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(AddonConfig::decode("not base64!").is_err());
        assert!(AddonConfig::decode(&encode("not json")).is_err());
        assert!(AddonConfig::decode(&encode("[1,2]")).is_err());
    }
}
