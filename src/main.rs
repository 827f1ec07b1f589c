//! Pricefeed Binary Entry Point
//!
//! Wires the full ingestion pipeline: NDJSON product observations (stdin or
//! file) flow through the ingest worker into the time-series store while a
//! periodic loop emits system status points. Core functionality is provided
//! by the `pricefeed` library crate.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use pricefeed::{
    config::AppConfig,
    ingest::{IngestWorker, SystemMetricsEmitter},
    model::ProductObservation,
    point::PointBuilder,
    store::{InfluxClientBuilder, StoreClient},
    sysmon::SystemSampler,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Pricefeed - Grocery Price Telemetry Ingestion
#[derive(Parser, Debug)]
#[command(name = "pricefeed", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = "configs/config.yaml",
        env = "PRICEFEED_CONFIG"
    )]
    config: String,

    /// Store endpoint URL (overrides config file)
    #[arg(long, env = "PRICEFEED_STORE_URL")]
    store_url: Option<String>,

    /// Logical database name (overrides config file)
    #[arg(long, env = "PRICEFEED_DATABASE")]
    database: Option<String>,

    /// NDJSON observation input file (stdin when omitted)
    #[arg(long)]
    input: Option<PathBuf>,

    /// System status emission interval (overrides config file)
    #[arg(long, value_parser = humantime::parse_duration)]
    status_interval: Option<Duration>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pricefeed=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Pricefeed - Grocery Price Telemetry Ingestion");

    let cli = Cli::parse();

    tracing::info!("Loading configuration from: {}", cli.config);
    let mut config = AppConfig::load(&cli.config)?;

    // Apply CLI/env overrides (CLI > ENV > config file)
    if let Some(url) = cli.store_url {
        config.store.url = url;
    }
    if let Some(database) = cli.database {
        config.store.database = database;
    }
    if let Some(interval) = cli.status_interval {
        config.service.status_interval = interval;
    }
    config.validate()?;

    tracing::info!(
        "Store: {} ({}), measurements: {}/{}",
        config.store.url,
        config.store.database,
        config.store.product_measurement,
        config.store.system_measurement,
    );

    // Connect; an unreachable store is fatal to startup.
    let store = Arc::new(
        InfluxClientBuilder::new(
            config.store.url.clone(),
            config.store.token.clone(),
            config.store.database.clone(),
        )
        .batch_size(config.store.batch_size)
        .flush_interval(config.store.flush_interval)
        .connect_timeout(config.store.connect_timeout)
        .connect()
        .await?,
    );
    tracing::info!("Store connection established");

    let builder = PointBuilder::new(
        config.store.product_measurement.clone(),
        config.store.system_measurement.clone(),
        config.service.name.clone(),
    );

    let cancel = CancellationToken::new();
    let (tx, rx) = mpsc::channel(config.ingest.channel_capacity);

    // Ingest worker
    let worker = IngestWorker::new(builder.clone(), Arc::clone(&store));
    let processed = worker.processed_counter();
    let mut worker_task = tokio::spawn(worker.run(rx, cancel.clone()));

    // Observation producer: distinct product ids feed the status loop.
    let product_count = Arc::new(AtomicU64::new(0));
    let producer_task = match cli.input {
        Some(ref path) => {
            tracing::info!("Reading observations from: {}", path.display());
            let file = tokio::fs::File::open(path).await?;
            tokio::spawn(produce(
                BufReader::new(file),
                tx,
                cancel.clone(),
                Arc::clone(&product_count),
            ))
        }
        None => {
            tracing::info!("Reading observations from stdin");
            tokio::spawn(produce(
                BufReader::new(tokio::io::stdin()),
                tx,
                cancel.clone(),
                Arc::clone(&product_count),
            ))
        }
    };

    // Periodic system status emission
    let emitter = SystemMetricsEmitter::new(builder, Arc::clone(&store));
    let status_task = tokio::spawn(status_loop(
        emitter,
        processed,
        Arc::clone(&product_count),
        config.service.status_interval,
        cancel.clone(),
    ));

    tracing::info!("Press Ctrl+C to shutdown");

    // Run until a shutdown signal arrives or the input is exhausted.
    let worker_result = tokio::select! {
        _ = shutdown_signal() => None,
        result = &mut worker_task => Some(result),
    };
    cancel.cancel();

    let worker_result = match worker_result {
        Some(result) => result,
        None => worker_task.await,
    };
    match worker_result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(error = %e, "Ingest worker could not confirm final delivery"),
        Err(e) => tracing::error!(error = %e, "Ingest worker task failed"),
    }

    let _ = producer_task.await;
    let _ = status_task.await;

    if let Err(e) = store.close().await {
        tracing::warn!(error = %e, "Store close could not confirm final delivery");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Read NDJSON observations and feed them to the ingest channel.
///
/// Malformed lines are skipped with a warning; one bad record must not stop
/// the feed. Distinct product ids bump the shared product counter.
async fn produce<R>(
    reader: R,
    tx: mpsc::Sender<ProductObservation>,
    cancel: CancellationToken,
    product_count: Arc<AtomicU64>,
) where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut seen = HashSet::new();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<ProductObservation>(line) {
                        Ok(obs) => {
                            if seen.insert(obs.id.clone()) {
                                product_count.fetch_add(1, Ordering::Relaxed);
                            }
                            if tx.send(obs).await.is_err() {
                                tracing::warn!("Ingest worker gone, stopping producer");
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Skipping malformed observation line");
                        }
                    }
                }
                Ok(None) => {
                    tracing::info!("Observation input exhausted");
                    break;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read observation input");
                    break;
                }
            }
        }
    }
}

/// Emit a system status point on every tick until cancelled.
async fn status_loop<S: StoreClient>(
    emitter: SystemMetricsEmitter<S>,
    processed: Arc<AtomicU64>,
    product_count: Arc<AtomicU64>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut sampler = SystemSampler::new(processed);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let snapshot = sampler.sample(product_count.load(Ordering::Relaxed) as i64);
                if let Err(e) = emitter.emit_status(&snapshot).await {
                    tracing::warn!(error = %e, "Failed to emit system status");
                }
            }
        }
    }
}

/// Setup graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal");
        }
    }
}
