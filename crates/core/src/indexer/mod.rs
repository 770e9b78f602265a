//! Torrent indexer clients.
//!
//! Each indexer implements [`Indexer`]; [`IndexerSet`] fans a title out to
//! all of them concurrently and never fails as a whole.

mod fanout;
mod sharewood;
mod types;
mod ygg;

pub use fanout::{search_with_fallback, IndexerSet};
pub use sharewood::SharewoodClient;
pub use types::*;
pub use ygg::YggClient;

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::Config;

/// Build the indexers enabled in the configuration.
pub fn indexers_from_config(config: &Config) -> Result<IndexerSet, IndexerError> {
    let timeout = Duration::from_secs(config.pipeline.upstream_timeout_secs);
    let mut indexers: Vec<Arc<dyn Indexer>> = Vec::new();

    if config.ygg.enabled {
        indexers.push(Arc::new(YggClient::new(&config.ygg, timeout)?));
    }
    if let Some(sharewood) = &config.sharewood {
        indexers.push(Arc::new(SharewoodClient::new(sharewood, timeout)?));
    }

    let set = IndexerSet::new(indexers, timeout);
    info!(indexers = ?set.names(), "Indexers configured");
    Ok(set)
}
