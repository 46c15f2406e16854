//! Abraham Event Indexer
//!
//! Replays decoded Abraham contract events from a feed into RocksDB,
//! maintaining Creation and PraiseCount aggregates plus an append-only raw
//! event log.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use abraham_indexer::config::IndexerConfig;
use abraham_indexer::consumer::EventConsumer;
use abraham_indexer::database::RocksDbStore;
use abraham_indexer::feed::JsonFileFeed;
use abraham_indexer::metrics::{self, Metrics};

#[derive(Parser)]
#[command(name = "abraham-indexer")]
#[command(about = "Abraham contract event projector")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "indexer.toml")]
    config: String,

    /// Override log level
    #[arg(long)]
    log_level: Option<String>,

    /// Dry run mode (validate config and exit)
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = if std::path::Path::new(&cli.config).exists() {
        IndexerConfig::from_file(&cli.config)?
    } else {
        warn!("Config file not found, using defaults: {}", cli.config);
        IndexerConfig::default()
    };

    if let Some(log_level) = cli.log_level {
        config.monitoring.log_level = log_level;
    }

    init_logging(&config);

    info!("Starting Abraham event indexer");
    info!("Event feed: {}", config.feed.events_path.display());
    info!("RocksDB path: {}", config.storage.rocksdb.path.display());
    info!(
        "Missing-aggregate policy: {:?}",
        config.projector.missing_aggregate_policy
    );

    config.validate()?;
    config.ensure_directories()?;

    if cli.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        return Ok(());
    }

    let store = Arc::new(RocksDbStore::open(&config.storage.rocksdb)?);
    let metrics = Arc::new(Metrics::new()?);

    let _metrics_server = if config.monitoring.metrics_port > 0 {
        Some(metrics::start_metrics_server(config.monitoring.metrics_port, metrics.clone()).await?)
    } else {
        None
    };

    let feed = JsonFileFeed::open(&config.feed.events_path)?;
    let consumer = EventConsumer::new(
        store.clone(),
        feed,
        config.projector.missing_aggregate_policy,
        metrics.clone(),
        config.projector.progress_log_interval,
    );

    let consumer_handle = tokio::spawn(consumer.run());

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
        result = consumer_handle => {
            match result {
                Ok(Ok(processed)) => info!("Consumer finished, {} events processed", processed),
                Ok(Err(e)) => error!("Consumer error: {}", e),
                Err(e) => error!("Consumer task error: {}", e),
            }
        }
    }

    store.flush()?;
    for (entity, count) in store.entity_counts()? {
        info!("{}: ~{} keys", entity, count);
    }

    info!("Shutting down Abraham event indexer");
    Ok(())
}

fn init_logging(config: &IndexerConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("abraham_indexer={}", config.monitoring.log_level).into());

    if config.monitoring.structured_logging {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
