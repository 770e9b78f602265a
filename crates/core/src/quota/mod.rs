//! Debrid account quota management.

mod config;
mod manager;
mod scheduler;

pub use config::QuotaConfig;
pub use manager::{QuotaManager, QuotaReport};
pub use scheduler::QuotaScheduler;

use thiserror::Error;

use crate::cache::CacheError;
use crate::debrid::DebridError;

/// Errors that abort a quota sweep.
#[derive(Debug, Error)]
pub enum QuotaError {
    #[error("Failed to read tracked magnets: {0}")]
    Cache(#[from] CacheError),

    #[error("Remote deletion failed: {0}")]
    Debrid(#[from] DebridError),
}
