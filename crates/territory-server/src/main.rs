//! Territory world engine server: wires the Redis `KVStore` and Postgres
//! `SnapshotSink` into `WorldEngine` and runs the recharge tick and
//! snapshot-flush loops until shutdown.

use std::sync::Arc;

use anyhow::Context;
use territory_core::WorldEngine;
use territory_server::{config::ServerConfig, PgSnapshotSink, RedisStore};
use tokio::sync::Notify;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("territory_server=info,territory_core=info")
        .init();

    let config_path = std::env::var("TERRITORY_CONFIG")
        .unwrap_or_else(|_| "territory-server.yaml".to_string());
    let config = ServerConfig::load_from_path(std::path::Path::new(&config_path))
        .with_context(|| format!("failed to load config from {config_path}"))?;

    info!(redis_url = %config.redis_url, "connecting to redis");
    let store = RedisStore::connect(&config.redis_url)
        .await
        .context("failed to connect to redis")?;

    info!(database_url = %config.database_url, "connecting to postgres");
    let sink = PgSnapshotSink::connect(&config.database_url)
        .await
        .context("failed to connect to postgres")?;

    let engine = Arc::new(WorldEngine::new(
        Arc::new(store),
        Arc::new(sink),
        Arc::new(territory_core::error_sink::TracingErrorSink),
        config.engine.clone(),
    ));

    info!("territory-server v{} starting", env!("CARGO_PKG_VERSION"));

    let recharge_cancel = Arc::new(Notify::new());
    let snapshot_cancel = Arc::new(Notify::new());

    let recharge_task = tokio::spawn(WorldEngine::run_recharge_loop(
        engine.clone(),
        recharge_cancel.clone(),
    ));
    let snapshot_task = tokio::spawn(WorldEngine::run_snapshot_loop(
        engine.clone(),
        snapshot_cancel.clone(),
    ));

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutdown requested, waiting for in-flight sweeps to finish");

    recharge_cancel.notify_one();
    snapshot_cancel.notify_one();
    let _ = tokio::join!(recharge_task, snapshot_task);

    info!("territory-server stopped");
    Ok(())
}
