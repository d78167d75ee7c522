//! The `parlance serve` command: run the HTTP service.

use anyhow::Context;
use clap::Args;
use parlance_core::{Config, Parlance};

use crate::server::{self, AppState};

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind (overrides `server.host`)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides `server.port` and `PORT`)
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Execute the serve command.
pub async fn execute(args: ServeArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let static_dir = config.static_dir();

    let parlance = Parlance::new(config);
    tracing::info!(
        "Translation chain: {}",
        parlance
            .translator()
            .provider_ids()
            .iter()
            .map(|id| id.as_str())
            .collect::<Vec<_>>()
            .join(" -> ")
    );
    if parlance.captioner().is_none() {
        tracing::warn!("No [caption] endpoint configured; /predict will answer 503");
    }

    let app = server::router(AppState::from_parlance(&parlance), static_dir.as_deref());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
