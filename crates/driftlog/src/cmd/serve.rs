//! Serve command - Run the change-feed drain
//!
//! Wires configuration → store provisioning → source → sink → pipeline and
//! runs until the process is signalled.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use driftlog_config::Config;
use driftlog_pipeline::DeliveryPipeline;
use driftlog_sinks::{RollingConfig, RollingFileSink};
use driftlog_sources::{CouchConfig, CouchSource, Provisioner};

/// Serve command arguments
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to configuration file (defaults to configs/config.toml if not specified)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Run the serve command
pub async fn run(args: ServeArgs) -> Result<()> {
    let config = load_config(args.config)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        store = %config.store.base_url(),
        db = %config.store.db_name,
        sink = %config.sink.path,
        "driftlog starting"
    );

    if let Err(e) = run_drain(config).await {
        error!(error = %e, "drain error");
        return Err(e);
    }

    info!("driftlog shutdown complete");
    Ok(())
}

/// Load configuration from the explicit path or the default locations
fn load_config(path: Option<PathBuf>) -> Result<Config> {
    if let Some(path) = path {
        // User explicitly provided config path - must exist
        if !path.exists() {
            return Err(anyhow::anyhow!(
                "config file not found: {}",
                path.display()
            ));
        }
        return Config::from_file(&path).context("failed to load configuration");
    }

    let default_paths = [
        PathBuf::from("configs/config.toml"),
        PathBuf::from("config.toml"),
    ];
    for path in &default_paths {
        if path.exists() {
            info!(config = %path.display(), "using config file");
            return Config::from_file(path).context("failed to load configuration");
        }
    }

    Err(anyhow::anyhow!(
        "no config file found (looked for configs/config.toml, config.toml); \
         pass one with --config"
    ))
}

/// Main drain loop
async fn run_drain(config: Config) -> Result<()> {
    // Provision the store with admin credentials, then drop to the
    // logging user for everything else.
    let couch_config = CouchConfig {
        base_url: config.store.base_url(),
        db_name: config.store.db_name.clone(),
        username: config.store.logging_user.username.clone(),
        password: config.store.logging_user.password.clone(),
        queue_size: config.source.queue_size,
    };

    let provisioner = Provisioner::new(
        &couch_config,
        &config.store.admin.username,
        &config.store.admin.password,
    )?;
    provisioner
        .provision(&couch_config.username, &couch_config.password)
        .await
        .context("store provisioning failed")?;

    let source = Arc::new(CouchSource::new(couch_config)?);

    ensure_sink_dir(Path::new(&config.sink.path))?;
    let sink = Arc::new(RollingFileSink::new(
        RollingConfig::default()
            .with_path(&config.sink.path)
            .with_roll_after_bytes(config.sink.roll_after_bytes),
    ));

    let pipeline = DeliveryPipeline::new(sink, source);

    // Coordinated shutdown on ctrl-c
    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            shutdown.cancel();
        }
    });

    let snapshot = pipeline.run(cancel).await.context("pipeline failed")?;
    info!(
        records = snapshot.records_delivered,
        bytes = snapshot.bytes_delivered,
        delivery_failures = snapshot.delivery_failures,
        ack_failures = snapshot.ack_failures,
        "pipeline stopped"
    );

    Ok(())
}

/// Create the sink's parent directory if it does not exist
fn ensure_sink_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create log directory {}", parent.display()))?;
        }
    }
    Ok(())
}
