//! wirestatd — the wirestat daemon.
//!
//! Single binary that assembles the wirestat subsystems:
//! - Sample store (redb)
//! - Collector poll loop
//! - Device summary refresher
//! - Query API
//!
//! The binary ships with the simulated device only; real wire clients are
//! embedded through the library API by implementing `MetricReader`.
//!
//! # Usage
//!
//! ```text
//! wirestatd run --simulate --data-dir /var/lib/wirestat --listen 0.0.0.0:8080
//! ```

mod config;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::info;

use wirestat_collector::{Collector, SummaryRefresher};
use wirestat_snmp::SimulatedAgent;
use wirestat_store::SampleStore;

use crate::config::WirestatConfig;

#[derive(Parser)]
#[command(name = "wirestatd", about = "wirestat daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the collector and query API in one process.
    Run {
        /// Path to wirestat.toml.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory for the sample database (overrides `store.path`).
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Query API listen address (overrides `api.listen`).
        #[arg(long)]
        listen: Option<SocketAddr>,

        /// Seconds between poll rounds (overrides `poll.interval_secs`).
        #[arg(long)]
        poll_interval: Option<u64>,

        /// Poll the built-in simulated device.
        #[arg(long)]
        simulate: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,wirestatd=debug,wirestat_collector=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            config,
            data_dir,
            listen,
            poll_interval,
            simulate,
        } => {
            let mut cfg = match &config {
                Some(path) => WirestatConfig::from_file(path)?,
                None => WirestatConfig::default(),
            };
            if let Some(dir) = data_dir {
                cfg.store.path = dir.join("samples.redb");
            }
            if let Some(addr) = listen {
                cfg.api.listen = addr;
            }
            if let Some(secs) = poll_interval {
                cfg.poll.interval_secs = secs;
            }
            run_daemon(cfg, simulate).await
        }
    }
}

async fn run_daemon(cfg: WirestatConfig, simulate: bool) -> anyhow::Result<()> {
    info!("wirestat daemon starting");

    if !simulate {
        anyhow::bail!(
            "no wire client is built into this binary; run with --simulate, \
             or embed a MetricReader through the library API"
        );
    }

    // Fail fast on a bad metric catalog before touching the disk.
    let catalog = Arc::new(cfg.catalog()?);
    info!(metric_groups = catalog.len(), "metric catalog loaded");

    // ── Sample store ───────────────────────────────────────────

    if let Some(parent) = cfg.store.path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let store = SampleStore::open(&cfg.store.path)?;
    info!(path = ?cfg.store.path, "sample store opened");

    // ── Collector + summary refresher ──────────────────────────

    let reader = Arc::new(SimulatedAgent::default_device());
    let target = cfg.target();
    info!(target = %target.source(), "polling simulated device");

    let collector = Collector::new(
        store.clone(),
        reader.clone(),
        target.clone(),
        catalog.clone(),
        cfg.poll_config(),
    );

    let refresher = SummaryRefresher::new(
        reader,
        target,
        cfg.summary_interval(),
        cfg.reader_config(),
    );
    let summary_rx = refresher.subscribe();

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let collector_shutdown = shutdown_rx.clone();
    let summary_shutdown = shutdown_rx;

    // ── Background tasks ───────────────────────────────────────

    let collector_handle = tokio::spawn(async move {
        collector.run(collector_shutdown).await;
    });

    let summary_handle = tokio::spawn(async move {
        refresher.run(summary_shutdown).await;
    });

    // ── Query API ──────────────────────────────────────────────

    let router = wirestat_api::build_router(wirestat_api::ApiState {
        store,
        catalog,
        summary: summary_rx,
    });

    info!(addr = %cfg.api.listen, "query API starting");

    let listener = tokio::net::TcpListener::bind(cfg.api.listen).await?;

    // Graceful shutdown on Ctrl-C.
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    server.await?;

    // Wait for background tasks.
    let _ = collector_handle.await;
    let _ = summary_handle.await;

    info!("wirestat daemon stopped");
    Ok(())
}
