use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use relaystream_core::{
    indexers_from_config, load_config, validate_config, AllDebridClient, Caches, DebridClient,
    MetadataProvider, QuotaManager, QuotaScheduler, StreamOrchestrator, TmdbClient,
};
use relaystream_server::api::create_router;
use relaystream_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("RELAYSTREAM_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;
    info!("Configuration loaded successfully");

    let timeout = config.pipeline.upstream_timeout();

    let caches = Caches::from_config(&config.cache).context("Failed to open cache store")?;

    let metadata: Arc<dyn MetadataProvider> = Arc::new(
        TmdbClient::new(&config.tmdb, timeout).context("Failed to create TMDB client")?,
    );

    let indexers = indexers_from_config(&config).context("Failed to create indexers")?;
    if indexers.is_empty() {
        warn!("No indexer enabled, every stream request will come back empty");
    }

    let debrid: Arc<dyn DebridClient> = Arc::new(
        AllDebridClient::new(&config.alldebrid, timeout)
            .context("Failed to create AllDebrid client")?,
    );

    let mut orchestrator = StreamOrchestrator::new(
        metadata,
        indexers,
        Arc::clone(&debrid),
        caches.clone(),
        config.pipeline.clone(),
    );

    // Quota sweeps run after uploads settle
    let scheduler = if config.quota.enabled {
        let manager = Arc::new(QuotaManager::new(
            Arc::clone(&debrid),
            caches.magnets.clone(),
            caches.file_listings.clone(),
            config.quota.clone(),
            timeout,
        ));
        let scheduler = Arc::new(QuotaScheduler::new(
            manager,
            Duration::from_secs(config.quota.debounce_secs),
        ));
        orchestrator = orchestrator.with_quota_scheduler(Arc::clone(&scheduler));
        info!(
            max_magnets = config.quota.max_magnets,
            delete_count = config.quota.delete_count,
            "Quota manager enabled"
        );
        Some(scheduler)
    } else {
        info!("Quota manager disabled in config");
        None
    };

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), Arc::new(orchestrator)));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    if let Some(scheduler) = scheduler {
        scheduler.cancel();
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
