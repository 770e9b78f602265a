//! Types for the debrid service boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Whether the debrid service holds the full content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    Ready,
    NotReady,
}

/// A content hash tracked by the debrid account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Magnet {
    /// Content hash (lowercase hex); the identity of the magnet.
    pub hash: String,
    /// Id assigned by the debrid service.
    pub remote_id: u64,
    pub name: String,
    pub size_bytes: u64,
    pub readiness: Readiness,
    /// Indexer the hash came from.
    pub source: String,
}

impl Magnet {
    pub fn is_ready(&self) -> bool {
        self.readiness == Readiness::Ready
    }
}

/// A hash to submit, with the indexer it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagnetRequest {
    pub hash: String,
    pub source: String,
}

/// One file of a ready magnet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoFile {
    pub name: String,
    pub size_bytes: u64,
    /// Locked link; must be unlocked before playback.
    pub link: String,
}

/// Errors that can occur talking to the debrid service.
#[derive(Debug, Error)]
pub enum DebridError {
    #[error("Debrid connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Debrid API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The service answered with an error envelope.
    #[error("Debrid rejected request: {code} - {message}")]
    Rejected { code: String, message: String },

    #[error("Failed to parse debrid response: {0}")]
    Parse(String),

    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

impl DebridError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, DebridError::Timeout)
    }
}

impl From<reqwest::Error> for DebridError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            DebridError::Timeout
        } else if e.is_connect() {
            DebridError::ConnectionFailed(e.to_string())
        } else if e.is_decode() {
            DebridError::Parse(e.to_string())
        } else {
            DebridError::Api {
                status: e.status().map(|s| s.as_u16()).unwrap_or(0),
                message: e.to_string(),
            }
        }
    }
}

/// A link-unlocking debrid service.
#[async_trait]
pub trait DebridClient: Send + Sync {
    /// Service name for logging.
    fn name(&self) -> &str;

    /// Submit hashes in one batch. Resubmitting a hash returns its current state.
    /// Hashes the service rejects individually are left out of the result.
    async fn upload_magnets(&self, magnets: &[MagnetRequest]) -> Result<Vec<Magnet>, DebridError>;

    /// Flattened file listing of a magnet.
    async fn list_files(&self, remote_id: u64) -> Result<Vec<VideoFile>, DebridError>;

    /// Turn a locked link into a direct URL.
    async fn unlock(&self, link: &str) -> Result<String, DebridError>;

    /// Remove magnets from the account in one batch.
    async fn delete_magnets(&self, remote_ids: &[u64]) -> Result<(), DebridError>;
}
