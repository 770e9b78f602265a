//! Deletes the oldest tracked magnets once the account holds too many.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::{QuotaConfig, QuotaError};
use crate::cache::TypedCache;
use crate::debrid::{DebridClient, DebridError, Magnet, VideoFile};
use crate::metrics::{QUOTA_DELETIONS, QUOTA_SWEEPS};

/// Outcome of one sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaReport {
    /// Magnets tracked before the sweep.
    pub tracked: usize,
    /// Hashes removed remotely and locally, oldest first.
    pub deleted: Vec<String>,
}

/// Keeps the debrid account under its storage quota.
pub struct QuotaManager {
    debrid: Arc<dyn DebridClient>,
    magnets: TypedCache<Magnet>,
    file_listings: TypedCache<Vec<VideoFile>>,
    config: QuotaConfig,
    timeout: Duration,
}

impl QuotaManager {
    pub fn new(
        debrid: Arc<dyn DebridClient>,
        magnets: TypedCache<Magnet>,
        file_listings: TypedCache<Vec<VideoFile>>,
        config: QuotaConfig,
        timeout: Duration,
    ) -> Self {
        Self {
            debrid,
            magnets,
            file_listings,
            config,
            timeout,
        }
    }

    pub fn config(&self) -> &QuotaConfig {
        &self.config
    }

    /// Run one sweep.
    ///
    /// When more than `max_magnets` are tracked, the oldest `delete_count`
    /// are deleted remotely in one batch and then forgotten locally, along
    /// with their cached file listings. A remote failure leaves local
    /// tracking untouched.
    pub async fn enforce(&self) -> Result<QuotaReport, QuotaError> {
        let tracked = self.magnets.entries().await?;
        let count = tracked.len();

        if count <= self.config.max_magnets {
            debug!(
                tracked = count,
                max = self.config.max_magnets,
                "Magnet count within quota"
            );
            QUOTA_SWEEPS.with_label_values(&["under_limit"]).inc();
            return Ok(QuotaReport {
                tracked: count,
                deleted: Vec::new(),
            });
        }

        let victims: Vec<_> = tracked
            .into_iter()
            .take(self.config.delete_count)
            .collect();
        let remote_ids: Vec<u64> = victims.iter().map(|e| e.value.remote_id).collect();

        info!(
            tracked = count,
            max = self.config.max_magnets,
            deleting = victims.len(),
            "Magnet quota exceeded, deleting oldest"
        );

        let deleted = tokio::time::timeout(self.timeout, self.debrid.delete_magnets(&remote_ids))
            .await
            .unwrap_or(Err(DebridError::Timeout));
        if let Err(e) = deleted {
            warn!(error = %e, count = remote_ids.len(), "Remote magnet deletion failed");
            QUOTA_SWEEPS.with_label_values(&["failed"]).inc();
            return Err(QuotaError::Debrid(e));
        }

        let mut removed = Vec::with_capacity(victims.len());
        for entry in victims {
            if let Err(e) = self.magnets.remove(&entry.key).await {
                warn!(hash = %entry.key, error = %e, "Failed to forget deleted magnet");
            }
            if let Err(e) = self.file_listings.remove(&entry.key).await {
                warn!(hash = %entry.key, error = %e, "Failed to drop file listing of deleted magnet");
            }
            removed.push(entry.key);
        }

        QUOTA_DELETIONS.inc_by(removed.len() as u64);
        QUOTA_SWEEPS.with_label_values(&["deleted"]).inc();
        info!(deleted = removed.len(), "Quota sweep complete");

        Ok(QuotaReport {
            tracked: count,
            deleted: removed,
        })
    }
}
