//! stanced: pose streaming daemon.
//!
//! Captures camera frames, runs the 33-point pose landmark model on a
//! dedicated worker thread and publishes typed landmark events over
//! D-Bus.

mod config;
mod dbus_interface;
mod engine;
mod event;
mod slot;

use dbus_interface::StanceService;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "stanced starting");

    let config = config::Config::load();

    let (result_tx, result_rx) = mpsc::channel(8);
    let engine = engine::spawn_engine(&config, result_tx)?;

    let connection = zbus::connection::Builder::session()?
        .name(dbus_interface::BUS_NAME)?
        .serve_at(
            dbus_interface::OBJECT_PATH,
            StanceService::new(engine.clone()),
        )?
        .build()
        .await?;

    tracing::info!(bus = dbus_interface::BUS_NAME, "D-Bus service registered");

    let pump = tokio::spawn(dbus_interface::run_event_pump(
        result_rx,
        engine.shared(),
        connection.clone(),
    ));

    tracing::info!("ready");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");

    if let Err(e) = engine.shutdown().await {
        tracing::warn!(error = %e, "engine shutdown incomplete");
    }
    let _ = pump.await;

    Ok(())
}
