//! Stream pipeline configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tuning for the stream pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Upper bound on every single upstream call (metadata, indexer, debrid).
    #[serde(default = "default_upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,

    /// Whether whole-series packs must also match the preference lists.
    #[serde(default = "default_gate_complete_series")]
    pub gate_complete_series: bool,
}

fn default_upstream_timeout_secs() -> u64 {
    15
}

fn default_gate_complete_series() -> bool {
    true
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            upstream_timeout_secs: default_upstream_timeout_secs(),
            gate_complete_series: default_gate_complete_series(),
        }
    }
}

impl PipelineConfig {
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}
