//! Title metadata lookup by external id.

mod tmdb;

pub use tmdb::TmdbClient;

use async_trait::async_trait;
use thiserror::Error;

use crate::media::{MediaKind, MediaMetadata};

/// Errors that can occur when resolving metadata.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Metadata service connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Client not configured (missing API key, etc.).
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

impl MetadataError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, MetadataError::Timeout)
    }
}

impl From<reqwest::Error> for MetadataError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            MetadataError::Timeout
        } else if e.is_connect() {
            MetadataError::ConnectionFailed(e.to_string())
        } else if e.is_decode() {
            MetadataError::Parse(e.to_string())
        } else {
            MetadataError::Api {
                status: e.status().map(|s| s.as_u16()).unwrap_or(0),
                message: e.to_string(),
            }
        }
    }
}

/// Resolves an external id into titles.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Look up an external id. `Ok(None)` means the id is unknown.
    ///
    /// `kind` is the kind the caller asked for; a provider may report a
    /// different one.
    async fn lookup(
        &self,
        external_id: &str,
        kind: MediaKind,
    ) -> Result<Option<MediaMetadata>, MetadataError>;
}
