use std::sync::Arc;

use anyhow::Context;

use incentive_api::{app, config::ApiConfig};
use incentive_notifications::{EmailQueue, LogMailer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    incentive_observability::init();

    let config = ApiConfig::from_env()?;
    tracing::info!(queue = ?config.queue, "configuration loaded");

    let email_queue = EmailQueue::new(Arc::new(LogMailer), config.queue.clone());
    let services = Arc::new(app::services::AppServices::new(
        email_queue.clone(),
        config.admin_email.clone(),
    ));
    let router = app::build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    // Give queued mail a chance to go out before exiting.
    if email_queue.is_running() {
        tracing::info!("waiting for email queue to drain");
        email_queue.wait_idle().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
