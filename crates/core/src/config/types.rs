use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::media::Preferences;
use crate::pipeline::PipelineConfig;
use crate::quota::QuotaConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub tmdb: TmdbConfig,
    #[serde(default)]
    pub ygg: YggConfig,
    #[serde(default)]
    pub sharewood: Option<SharewoodConfig>,
    pub alldebrid: AllDebridConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub quota: QuotaConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Preferences applied when the caller does not send any.
    #[serde(default)]
    pub defaults: Preferences,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    5000
}

/// TMDB metadata lookup configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TmdbConfig {
    /// TMDB API key (v3).
    pub api_key: String,
    /// Base URL (default: https://api.themoviedb.org/3).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Ygg API indexer configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct YggConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Base URL (default: https://yggapi.eu).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for YggConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: None,
        }
    }
}

/// Sharewood indexer configuration (disabled when the section is absent)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SharewoodConfig {
    /// Personal passkey, part of every API path.
    pub passkey: String,
    /// Base URL (default: https://www.sharewood.tv).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// AllDebrid configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AllDebridConfig {
    pub api_key: String,
    /// Base URL (default: https://api.alldebrid.com).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Agent name sent with each call.
    #[serde(default = "default_agent")]
    pub agent: String,
}

fn default_agent() -> String {
    "relaystream".to_string()
}

fn default_true() -> bool {
    true
}

/// Which store backs the caches
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    #[default]
    Memory,
    Sqlite,
}

/// Cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,
    /// SQLite file (only used by the sqlite backend).
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
    /// Expiry for assembled stream lists; `None` keeps them until replaced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streams_ttl_secs: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            path: default_cache_path(),
            streams_ttl_secs: None,
        }
    }
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("relaystream.db")
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub tmdb_configured: bool,
    pub ygg_enabled: bool,
    pub sharewood_configured: bool,
    pub alldebrid_configured: bool,
    pub cache: CacheConfig,
    pub quota: QuotaConfig,
    pub pipeline: PipelineConfig,
    pub defaults: Preferences,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            tmdb_configured: !config.tmdb.api_key.is_empty(),
            ygg_enabled: config.ygg.enabled,
            sharewood_configured: config
                .sharewood
                .as_ref()
                .is_some_and(|s| !s.passkey.is_empty()),
            alldebrid_configured: !config.alldebrid.api_key.is_empty(),
            cache: config.cache.clone(),
            quota: config.quota.clone(),
            pipeline: config.pipeline.clone(),
            defaults: config.defaults.clone(),
        }
    }
}
