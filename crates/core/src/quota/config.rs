//! Quota manager configuration.

use serde::{Deserialize, Serialize};

/// Limits on how many magnets stay on the debrid account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Whether uploads schedule quota sweeps.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Tracked magnet count above which a sweep deletes.
    #[serde(default = "default_max_magnets")]
    pub max_magnets: usize,

    /// How many of the oldest magnets one sweep deletes.
    #[serde(default = "default_delete_count")]
    pub delete_count: usize,

    /// Quiet period after the last upload before a sweep runs.
    #[serde(default = "default_debounce_secs")]
    pub debounce_secs: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_max_magnets() -> usize {
    200
}

fn default_delete_count() -> usize {
    50
}

fn default_debounce_secs() -> u64 {
    30
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_magnets: default_max_magnets(),
            delete_count: default_delete_count(),
            debounce_secs: default_debounce_secs(),
        }
    }
}
