use std::sync::Arc;

use anyhow::Context;

use jobboard_api::app::{self, services::AppServices};
use jobboard_api::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    jobboard_observability::init();

    let config = Config::from_env().context("failed to load configuration")?;

    let services = Arc::new(AppServices::from_config(&config));
    let sweeper = services.spawn_retention_sweeper(config.retention_policy());

    let app = app::build_app(services, &config.api_prefix);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(
        "listening on {}{}/jobs",
        listener.local_addr().context("listener has no local address")?,
        config.api_prefix
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    sweeper.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for ctrl+c: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("received ctrl+c interrupt, closing server");
}
