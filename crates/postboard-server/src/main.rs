//! postboard-server binary
//!
//! Usage:
//!   postboard-server --listen 127.0.0.1:3030
//!   postboard-server --api-base http://localhost:9000 --data-dir ./data
//!   postboard-server --ephemeral

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use postboard_server::config::Args;
use postboard_server::http::{router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Args::parse().into_config()?;

    let http = reqwest::Client::builder()
        .user_agent(format!("postboard/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .context("build http client")?;

    let state = Arc::new(AppState::from_config(&config, http));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("bind {}", config.listen))?;

    info!(listen = %config.listen, api = %config.api_base, "postboard listening");
    match &config.data_dir {
        Some(dir) => info!(dir = %dir.display(), key = %config.storage_key, "snapshot on disk"),
        None => info!("snapshot in memory only"),
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "ctrl-c handler unavailable");
                std::future::pending::<()>().await;
            }
            info!("shutting down");
        })
        .await
        .context("server error")?;

    Ok(())
}
