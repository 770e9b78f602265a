use std::sync::Arc;

use relaystream_core::{Config, Preferences, SanitizedConfig, StreamOrchestrator};

/// Shared application state
pub struct AppState {
    config: Config,
    orchestrator: Arc<StreamOrchestrator>,
}

impl AppState {
    pub fn new(config: Config, orchestrator: Arc<StreamOrchestrator>) -> Self {
        Self {
            config,
            orchestrator,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn orchestrator(&self) -> &StreamOrchestrator {
        self.orchestrator.as_ref()
    }

    /// Preferences used for fields the caller's addon config leaves out.
    pub fn default_preferences(&self) -> &Preferences {
        &self.config.defaults
    }
}
