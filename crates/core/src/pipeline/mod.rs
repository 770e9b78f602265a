//! Stream resolution pipeline.

mod config;
mod naming;
mod orchestrator;

pub use config::PipelineConfig;
pub use naming::{build_stream, source_label};
pub use orchestrator::StreamOrchestrator;
