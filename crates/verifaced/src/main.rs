use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use veriface_core::DecisionEngine;

mod config;
mod dbus_interface;

const BUS_NAME: &str = "org.veriface.Engine1";
const OBJECT_PATH: &str = "/org/veriface/Engine1";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("verifaced starting");

    // Resolve and validate configuration synchronously (fail-fast).
    let config = config::Config::from_env();
    let engine_config = config.engine_config()?;
    tracing::info!(
        base_threshold = engine_config.base_threshold,
        quality_floor = engine_config.quality_floor,
        min_votes = engine_config.min_votes,
        "engine configuration resolved"
    );

    let engine = DecisionEngine::new(engine_config).context("engine configuration rejected")?;
    let service = dbus_interface::EngineService::new(engine);

    let _connection = zbus::connection::Builder::session()
        .context("connecting to session bus")?
        .name(BUS_NAME)
        .context("claiming bus name")?
        .serve_at(OBJECT_PATH, service)
        .context("registering object path")?
        .build()
        .await
        .context("establishing D-Bus connection")?;

    tracing::info!(bus = BUS_NAME, path = OBJECT_PATH, "verifaced ready");

    tokio::signal::ctrl_c().await?;
    tracing::info!("verifaced shutting down");

    Ok(())
}
