//! Memo Relay Server binary.

use std::sync::Arc;

use anyhow::Context;
use memo_server::{
    AppState, Settings, create_router, metrics::init_metrics, run_server, shutdown_signal,
};
use memo_store::{InMemoryTable, MemoCache, MemoStore, SweepScheduler, SweepState};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load().context("failed to load settings")?;
    let addr = settings.addr()?;

    tracing::info!("Starting Memo Relay Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        cache_ttl_minutes = settings.cache_ttl_minutes,
        sweep_interval_secs = settings.sweep_interval_secs,
        delivered_grace_minutes = settings.delivered_grace_minutes,
        default_window_hours = settings.default_window_hours,
        "Settings loaded"
    );

    let prometheus = init_metrics().context("failed to install metrics recorder")?;

    let store = MemoStore::new(
        Arc::new(InMemoryTable::new()),
        MemoCache::new(settings.cache_config()?),
        settings.expiry_policy()?,
    );
    tracing::info!(table = store.table_name(), "Memo store ready");

    let sweep_state = Arc::new(SweepState::new());
    let sweep = SweepScheduler::new(store.clone(), sweep_state.clone(), settings.sweep_config()?)
        .start();

    let app = create_router(AppState::new(store, sweep_state), prometheus);
    let served = run_server(addr, app, shutdown_signal()).await;

    // Let an in-flight sweep finish before exiting.
    sweep.shutdown().await;
    tracing::info!("Server stopped");

    served.context("server error")
}
