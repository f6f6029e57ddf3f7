//! Event host entry point.
//!
//! Boots the coordinator from the data directory, logs lifecycle events
//! and tears everything down on Ctrl-C.
mod config;

use std::path::Path;

use anyhow::{Context, Result};
use event_content::{ConfigLoader, EventConfig};
use event_runtime::{Envelope, EventCoordinator, Store, Topic};
use tokio::sync::broadcast;
use tracing::{info, warn};

use config::{DEFAULT_EVENT_CONFIG, HostConfig};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = HostConfig::from_env();
    let event_config = load_event_config(&config.config_path)?;

    let coordinator = EventCoordinator::builder(Store::new(&config.data_dir))
        .config(config.coordinator.clone())
        .event_config(event_config)
        .build()
        .await
        .context("failed to start the event coordinator")?;

    let mode = coordinator.current_mode().await?;
    let modes: Vec<&str> = coordinator.modes().names().collect();
    info!(
        "Serving events from {} in mode {} (available: {})",
        config.data_dir.display(),
        mode.name,
        modes.join(", ")
    );

    tokio::spawn(log_events(coordinator.subscribe(Topic::Session)));
    tokio::spawn(log_events(coordinator.subscribe(Topic::Config)));

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    let cleared = coordinator.shutdown().await?;
    info!("Shut down; cleared {} player records", cleared);
    Ok(())
}

/// Load the event configuration, writing the built-in one on first start.
fn load_event_config(path: &Path) -> Result<EventConfig> {
    if !path.exists() {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        std::fs::write(path, DEFAULT_EVENT_CONFIG)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("Wrote default event configuration to {}", path.display());
    }

    Ok(ConfigLoader::load(path)?)
}

async fn log_events(mut rx: broadcast::Receiver<Envelope>) {
    loop {
        match rx.recv().await {
            Ok(envelope) => info!("[{}] {:?}", envelope.seq, envelope.event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Event log lagged; skipped {} events", skipped)
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
