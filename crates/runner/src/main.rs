use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use prometheus::{Encoder, Registry, TextEncoder};
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tvfeed_core::{
    load_config, metrics, validate_config, FeedCache, HttpFeedClient, ProviderRegistry, SearchMode,
    SearchOrchestrator, SqliteFeedCache, SqliteHistoryStore,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

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
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("tvfeed {}", VERSION);

    // Determine config path
    let config_path = std::env::var("TVFEED_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(config_hash = &config_hash[..16], "Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);

    let metrics_registry = create_metrics_registry().context("Failed to register metrics")?;

    // Make sure the history table exists before anything snatches
    SqliteHistoryStore::new(&config.database.path).context("Failed to create history store")?;
    info!("History store initialized");

    let providers = ProviderRegistry::from_config(&config);
    if providers.enabled().next().is_none() {
        warn!("No enabled providers configured");
    }
    info!(providers = providers.len(), "Provider registry built");

    let client = HttpFeedClient::new(&config.search).context("Failed to create HTTP client")?;
    let mut orchestrator = SearchOrchestrator::new(Arc::new(client))
        .with_max_concurrent_queries(config.search.max_concurrent_queries);

    if config.cache.enabled {
        let cache = match &config.cache.path {
            Some(path) => SqliteFeedCache::new(path).context("Failed to create feed cache")?,
            None => SqliteFeedCache::in_memory().context("Failed to create feed cache")?,
        };

        let cutoff = config
            .cache
            .prune_cutoff(chrono::Utc::now())
            .context("cache.retention_secs is out of range")?;
        match cache.prune(cutoff) {
            Ok(removed) => info!(removed = removed, "Feed cache pruned"),
            Err(e) => warn!(error = %e, "Failed to prune feed cache"),
        }

        orchestrator = orchestrator.with_cache(Arc::new(cache));
        info!("Feed cache initialized");
    }

    // Search terms from the command line; none means the broad feed
    let terms: Vec<String> = std::env::args().skip(1).collect();
    let modes: Vec<SearchMode> = if terms.is_empty() {
        vec![SearchMode::Broad]
    } else {
        terms.into_iter().map(SearchMode::Term).collect()
    };

    let results = orchestrator.search_all(&providers, &modes).await;
    let total: usize = results.iter().map(|r| r.candidates.len()).sum();
    info!(passes = results.len(), candidates = total, "Search finished");

    log_metrics(&metrics_registry);

    println!(
        "{}",
        serde_json::to_string_pretty(&results).context("Failed to serialize results")?
    );

    Ok(())
}

fn create_metrics_registry() -> Result<Registry> {
    let registry = Registry::new();
    for metric in metrics::all_metrics() {
        registry.register(metric)?;
    }
    Ok(registry)
}

/// Dump the collected metrics in text exposition format at debug level.
fn log_metrics(registry: &Registry) {
    let families = registry.gather();
    let mut buffer = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&families, &mut buffer) {
        warn!(error = %e, "Failed to encode metrics");
        return;
    }
    info!(families = families.len(), "Metrics collected");
    debug!("{}", String::from_utf8_lossy(&buffer));
}
