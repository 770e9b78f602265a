//! Mock metadata provider for testing.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::media::{MediaKind, MediaMetadata};
use crate::metadata::{MetadataError, MetadataProvider};

/// Mock implementation of the [`MetadataProvider`] trait.
///
/// Ids without configured metadata resolve to `Ok(None)`.
pub struct MockMetadataProvider {
    entries: Arc<RwLock<HashMap<String, MediaMetadata>>>,
    fail: Arc<RwLock<bool>>,
    lookups: Arc<RwLock<Vec<(String, MediaKind)>>>,
}

impl Default for MockMetadataProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMetadataProvider {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            fail: Arc::new(RwLock::new(false)),
            lookups: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Register metadata under its external id.
    pub async fn add(&self, metadata: MediaMetadata) {
        self.entries
            .write()
            .await
            .insert(metadata.external_id.clone(), metadata);
    }

    /// Make every lookup fail with a connection error.
    pub async fn set_failing(&self, fail: bool) {
        *self.fail.write().await = fail;
    }

    /// Lookups received so far, in call order.
    pub async fn lookups(&self) -> Vec<(String, MediaKind)> {
        self.lookups.read().await.clone()
    }

    pub async fn lookup_count(&self) -> usize {
        self.lookups.read().await.len()
    }
}

#[async_trait]
impl MetadataProvider for MockMetadataProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn lookup(
        &self,
        external_id: &str,
        kind: MediaKind,
    ) -> Result<Option<MediaMetadata>, MetadataError> {
        self.lookups
            .write()
            .await
            .push((external_id.to_string(), kind));

        if *self.fail.read().await {
            return Err(MetadataError::ConnectionFailed("mock failure".to_string()));
        }
        Ok(self.entries.read().await.get(external_id).cloned())
    }
}
