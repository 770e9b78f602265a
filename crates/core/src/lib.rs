pub mod cache;
pub mod classify;
pub mod config;
pub mod debrid;
pub mod indexer;
pub mod media;
pub mod metadata;
pub mod metrics;
pub mod pipeline;
pub mod quota;
pub mod testing;

pub use cache::{CacheError, Caches};
pub use config::{
    load_config, load_config_from_str, validate_config, CacheBackend, Config, ConfigError,
    SanitizedConfig,
};
pub use debrid::{AllDebridClient, DebridClient, DebridError};
pub use indexer::{indexers_from_config, Indexer, IndexerError, IndexerSet};
pub use media::{MediaKind, MediaQuery, Preferences, QueryError, Stream};
pub use metadata::{MetadataError, MetadataProvider, TmdbClient};
pub use pipeline::{PipelineConfig, StreamOrchestrator};
pub use quota::{QuotaConfig, QuotaManager, QuotaScheduler};
