use std::process::ExitCode;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use synth_dashboard::config::Config;
use synth_dashboard::dashboard::{start_dashboard_server, DashboardState, RefreshPoller};
use synth_dashboard::error::DashboardError;
use synth_dashboard::DashboardEngine;

// ========================================
// MAIN ENTRY POINT
// ========================================

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[Dashboard] {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), DashboardError> {
    let config = Config::from_env()?;

    let filter = EnvFilter::try_new(&config.dashboard.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("🚀 Synth Dashboard v{} starting...", env!("CARGO_PKG_VERSION"));
    tracing::info!("📡 Local synth-client at {}", config.synth.local_url);

    // Discovery runs exactly once for the whole session.
    let engine = DashboardEngine::connect(config.synth.clone()).await?;

    let token = CancellationToken::new();
    let (poller, poll_task) =
        RefreshPoller::spawn(engine.clone(), config.dashboard.refresh_interval(), token.clone());

    let shutdown = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("[Dashboard] Shutdown requested");
                shutdown.cancel();
            }
            Err(e) => tracing::warn!("[Dashboard] Cannot listen for Ctrl-C: {}", e),
        }
    });

    let served = start_dashboard_server(
        DashboardState { engine, poller },
        &config.dashboard.addr(),
        token.clone(),
    )
    .await;

    token.cancel();
    if let Err(e) = poll_task.await {
        tracing::warn!("[Dashboard] Poller task ended abnormally: {}", e);
    }
    served
}
