use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use roadstats::{AppConfig, AppState, RecordStore, build_router};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    roadstats::telemetry::init_tracing("roadstats=debug,tower_http=info");

    let config = AppConfig::parse();

    let store = RecordStore::open(&config.data_file, config.id_policy).with_context(|| {
        format!(
            "failed to open record store at '{}'",
            config.data_file.display()
        )
    })?;

    let app = build_router(AppState::new(Arc::new(store)));

    let addr = config.address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(address = %addr, "roadstats API started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c() => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "SIGTERM handler unavailable; waiting for Ctrl+C only");
                ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    ctrl_c().await;

    info!("shutdown signal received, draining connections");
}

async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "unable to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
