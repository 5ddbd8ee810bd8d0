//! `glanced` — the glance collector daemon.
//!
//! Reads the operator's JSON config file (path from `GLANCE_CONFIG`,
//! default `./data/config.json`) for the trusted client list and the
//! static token, then serves until Ctrl-C. `GLANCE_BIND` overrides the
//! listen address; `RUST_LOG` controls log verbosity.

use anyhow::Context;
use glance_auth::KeyRegistry;
use glance_server::{GlanceServerBuilder, JsonFileSource, ServerConfig};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "./data/config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::var("GLANCE_CONFIG")
        .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let source = JsonFileSource::new(&config_path);
    let file = source
        .read()
        .await
        .with_context(|| format!("reading {config_path}"))?;

    let config = ServerConfig {
        bind_addr: std::env::var("GLANCE_BIND")
            .unwrap_or_else(|_| ServerConfig::default().bind_addr),
        legacy_token: file.legacy_token(),
        ..ServerConfig::default()
    };

    let registry = KeyRegistry::new(source)
        .await
        .context("loading key registry")?;
    tracing::info!(clients = registry.len().await, path = %config_path, "registry loaded");

    let server = GlanceServerBuilder::new().config(config).build(registry).await?;
    tracing::info!(addr = %server.local_addr()?, "listening");

    let shutdown = server.shutdown_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown requested");
            shutdown.cancel();
        }
    });

    server.run().await?;
    Ok(())
}
