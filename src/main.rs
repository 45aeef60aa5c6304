// src/main.rs

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use lease_ledger::{
    config::{AppConfig, AppState},
    services::scheduler::run_invoice_scheduler,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = AppConfig::from_env()?;
    let bind_addr = config.bind_addr.clone();
    let sweep_interval = config.sweep_interval;

    let app_state = AppState::new(config).await?;

    match sweep_interval {
        Some(every) => {
            tokio::spawn(run_invoice_scheduler(app_state.invoice_service.clone(), every));
        }
        None => tracing::info!("invoice scheduler disabled"),
    }

    let app = lease_ledger::app(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(addr = %listener.local_addr()?, "server listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
