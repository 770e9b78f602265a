//! Mock debrid client for testing.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::debrid::{DebridClient, DebridError, Magnet, MagnetRequest, Readiness, VideoFile};

/// Mock implementation of the [`DebridClient`] trait.
///
/// Uploaded hashes get sequential remote ids starting at 1 (stable across
/// re-uploads of the same hash) and are ready unless configured otherwise.
/// Unlocking a link returns `<link>?unlocked`.
pub struct MockDebridClient {
    remote_ids: Arc<RwLock<HashMap<String, u64>>>,
    not_ready: Arc<RwLock<HashSet<String>>>,
    rejected: Arc<RwLock<HashSet<String>>>,
    files: Arc<RwLock<HashMap<u64, Vec<VideoFile>>>>,
    failing_links: Arc<RwLock<HashSet<String>>>,
    fail_uploads: Arc<RwLock<bool>>,
    fail_deletes: Arc<RwLock<bool>>,
    delete_delay: Arc<RwLock<Option<Duration>>>,
    uploads: Arc<RwLock<Vec<Vec<String>>>>,
    listings: Arc<RwLock<Vec<u64>>>,
    unlocks: Arc<RwLock<Vec<String>>>,
    deletions: Arc<RwLock<Vec<Vec<u64>>>>,
}

impl Default for MockDebridClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDebridClient {
    pub fn new() -> Self {
        Self {
            remote_ids: Arc::new(RwLock::new(HashMap::new())),
            not_ready: Arc::new(RwLock::new(HashSet::new())),
            rejected: Arc::new(RwLock::new(HashSet::new())),
            files: Arc::new(RwLock::new(HashMap::new())),
            failing_links: Arc::new(RwLock::new(HashSet::new())),
            fail_uploads: Arc::new(RwLock::new(false)),
            fail_deletes: Arc::new(RwLock::new(false)),
            delete_delay: Arc::new(RwLock::new(None)),
            uploads: Arc::new(RwLock::new(Vec::new())),
            listings: Arc::new(RwLock::new(Vec::new())),
            unlocks: Arc::new(RwLock::new(Vec::new())),
            deletions: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Report `hash` as still downloading on upload.
    pub async fn set_not_ready(&self, hash: &str) {
        self.not_ready.write().await.insert(hash.to_string());
    }

    /// Report `hash` as ready on upload.
    pub async fn set_ready(&self, hash: &str) {
        self.not_ready.write().await.remove(hash);
    }

    /// Omit `hash` from upload answers, as the service does for a per-magnet error.
    pub async fn reject_upload(&self, hash: &str) {
        self.rejected.write().await.insert(hash.to_string());
    }

    /// Files listed for the magnet with `remote_id`.
    pub async fn set_files(&self, remote_id: u64, files: Vec<VideoFile>) {
        self.files.write().await.insert(remote_id, files);
    }

    /// Make unlocking `link` fail.
    pub async fn fail_unlock(&self, link: &str) {
        self.failing_links.write().await.insert(link.to_string());
    }

    pub async fn fail_uploads(&self, fail: bool) {
        *self.fail_uploads.write().await = fail;
    }

    pub async fn fail_deletes(&self, fail: bool) {
        *self.fail_deletes.write().await = fail;
    }

    /// Apply deletes immediately but answer only after `delay`.
    pub async fn set_delete_delay(&self, delay: Duration) {
        *self.delete_delay.write().await = Some(delay);
    }

    /// Hashes of each upload batch, in call order.
    pub async fn upload_calls(&self) -> Vec<Vec<String>> {
        self.uploads.read().await.clone()
    }

    /// Remote ids passed to `list_files`, in call order.
    pub async fn listed_magnets(&self) -> Vec<u64> {
        self.listings.read().await.clone()
    }

    pub async fn list_files_count(&self) -> usize {
        self.listings.read().await.len()
    }

    /// Links passed to `unlock`, in call order, failures included.
    pub async fn unlocked_links(&self) -> Vec<String> {
        self.unlocks.read().await.clone()
    }

    pub async fn unlock_count(&self) -> usize {
        self.unlocks.read().await.len()
    }

    /// Remote ids of each delete batch, in call order.
    pub async fn deleted_batches(&self) -> Vec<Vec<u64>> {
        self.deletions.read().await.clone()
    }

    async fn remote_id_for(&self, hash: &str) -> u64 {
        let mut ids = self.remote_ids.write().await;
        let next = ids.len() as u64 + 1;
        *ids.entry(hash.to_string()).or_insert(next)
    }
}

#[async_trait]
impl DebridClient for MockDebridClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn upload_magnets(&self, magnets: &[MagnetRequest]) -> Result<Vec<Magnet>, DebridError> {
        self.uploads
            .write()
            .await
            .push(magnets.iter().map(|m| m.hash.clone()).collect());

        if *self.fail_uploads.read().await {
            return Err(DebridError::Api {
                status: 503,
                message: "mock failure".to_string(),
            });
        }

        let mut uploaded = Vec::new();
        for request in magnets {
            if self.rejected.read().await.contains(&request.hash) {
                continue;
            }
            let readiness = if self.not_ready.read().await.contains(&request.hash) {
                Readiness::NotReady
            } else {
                Readiness::Ready
            };
            uploaded.push(Magnet {
                hash: request.hash.clone(),
                remote_id: self.remote_id_for(&request.hash).await,
                name: format!("Mock Magnet {}", request.hash),
                size_bytes: 1024 * 1024 * 1024,
                readiness,
                source: request.source.clone(),
            });
        }
        Ok(uploaded)
    }

    async fn list_files(&self, remote_id: u64) -> Result<Vec<VideoFile>, DebridError> {
        self.listings.write().await.push(remote_id);
        Ok(self
            .files
            .read()
            .await
            .get(&remote_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn unlock(&self, link: &str) -> Result<String, DebridError> {
        self.unlocks.write().await.push(link.to_string());

        if self.failing_links.read().await.contains(link) {
            return Err(DebridError::Rejected {
                code: "LINK_DOWN".to_string(),
                message: "mock failure".to_string(),
            });
        }
        Ok(format!("{}?unlocked", link))
    }

    async fn delete_magnets(&self, remote_ids: &[u64]) -> Result<(), DebridError> {
        if *self.fail_deletes.read().await {
            return Err(DebridError::Api {
                status: 503,
                message: "mock failure".to_string(),
            });
        }
        self.deletions.write().await.push(remote_ids.to_vec());

        let delay = *self.delete_delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }
}
