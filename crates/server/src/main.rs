//! VaultDrop server - encrypted file storage and sharing over HTTP.
//!
//! Hosts the API (upload, search, share, delete, access) plus a background
//! expiry worker that removes files past their retention window.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};
use url::Url;

use service::{Config, ServiceState};

const FINAL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// VaultDrop server - encrypted file storage and sharing
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on for HTTP requests
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Path to SQLite database file
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Root directory for encrypted blob storage
    #[arg(short, long)]
    uploads: Option<PathBuf>,

    /// Externally visible base URL used when building share links
    #[arg(long)]
    public_url: Option<Url>,

    /// How long uploaded files are kept, in hours
    #[arg(long, default_value = "24")]
    retention_hours: u64,

    /// How often the expiry worker sweeps, in minutes
    #[arg(long, default_value = "60")]
    sweep_interval_minutes: u64,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let (non_blocking_writer, _guard) = tracing_appender::non_blocking(std::io::stdout());
    let log_level: tracing::Level = args.log_level.parse().unwrap_or(tracing::Level::INFO);
    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(non_blocking_writer)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(stdout_layer).init();

    tracing::info!("Starting VaultDrop server");

    let mut config = Config::default();

    if let Some(db_path) = args.database {
        config.sqlite_path = Some(db_path);
    }

    if let Some(uploads_path) = args.uploads {
        config.uploads_path = Some(uploads_path);
    }

    if let Some(public_url) = args.public_url {
        config.public_url = public_url;
    }

    config.api_listen_addr = Some(SocketAddr::from_str(&format!("0.0.0.0:{}", args.port))?);
    config.retention = Duration::from_secs(args.retention_hours * 60 * 60);
    config.sweep_interval = Duration::from_secs(args.sweep_interval_minutes * 60);
    config.log_level = log_level;

    // Secrets come from the environment, never from flags
    config.master_key_hex = std::env::var("VAULTDROP_MASTER_KEY").ok();
    if let Ok(key_id) = std::env::var("VAULTDROP_MASTER_KEY_ID") {
        config.master_key_id = key_id;
    }
    config.token_secret = std::env::var("VAULTDROP_TOKEN_SECRET").ok();

    let state = match ServiceState::from_config(&config).await {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to create service state: {}", e);
            std::process::exit(1);
        }
    };

    // Set up graceful shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let graceful_shutdown = async move {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl+c");
        tracing::info!("Received shutdown signal");
        let _ = shutdown_tx.send(());
    };
    tokio::spawn(graceful_shutdown);

    // Spawn the expiry worker
    let worker = service::ExpiryWorker::new(
        state.database().clone(),
        state.blobs().clone(),
        config.retention,
        config.sweep_interval,
    );
    let worker_rx = shutdown_rx.clone();
    let worker_handle = tokio::spawn(worker.run(worker_rx));

    let listen_addr = config
        .api_listen_addr
        .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8080)));

    service::http_server::run(listen_addr, state, shutdown_rx.clone()).await?;

    // Wait for the worker to drain
    let _ = tokio::time::timeout(FINAL_SHUTDOWN_TIMEOUT, worker_handle).await;

    tracing::info!("Server shutdown complete");
    Ok(())
}
