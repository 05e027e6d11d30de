mod config;
mod error;
mod escape;
mod notification;
mod template;
mod transport;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::join_all;
use serde_json::Value;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::notification::{transport_config_with_proxy, ProviderRegistry};
use crate::transport::HttpTransport;

/// Usage: monitor-notify [config.toml] [message] [monitor.json] [heartbeat.json]
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,monitor_notify=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let config_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));
    let message = args
        .next()
        .unwrap_or_else(|| "Test notification".to_string());
    let monitor = match args.next() {
        Some(path) => Some(read_json(Path::new(&path)).await?),
        None => None,
    };
    let heartbeat = match args.next() {
        Some(path) => Some(read_json(Path::new(&path)).await?),
        None => None,
    };

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Notifications: {}", config.notifications.len());
    if let Some(proxy) = &config.proxy {
        info!("  Proxy: {}", proxy.url());
    }

    let transport = Arc::new(HttpTransport::new(&transport_config_with_proxy(&config))?);
    let registry = ProviderRegistry::with_builtin(transport);
    info!("  Providers: {}", registry.names().join(", "));

    if config.notifications.is_empty() {
        warn!("No notifications configured, nothing to send");
        return Ok(());
    }

    let msg = Value::String(message);
    let sends = config.notifications.iter().map(|notification| {
        registry.send(notification, &msg, monitor.as_ref(), heartbeat.as_ref())
    });
    let results = join_all(sends).await;

    let mut failed = 0;
    for (notification, result) in config.notifications.iter().zip(results) {
        let kind = notification
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        match result {
            Ok(ok) => info!("{}: {}", kind, ok),
            Err(e) => {
                error!("{}: {}", kind, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!(
            "{} of {} notifications failed",
            failed,
            config.notifications.len()
        );
    }

    Ok(())
}

async fn read_json(path: &Path) -> Result<Value> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}
