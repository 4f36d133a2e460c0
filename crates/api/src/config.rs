//! Process configuration for the API binary.

use std::net::SocketAddr;

use anyhow::Context;

use incentive_notifications::QueueConfig;

/// Settings read at startup.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    /// Recipient of "deal awaiting approval" notifications.
    pub admin_email: String,
    pub queue: QueueConfig,
}

impl ApiConfig {
    /// Read `BIND_ADDR`, `ADMIN_EMAIL` and the `EMAIL_QUEUE_*` settings.
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = std::env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .context("BIND_ADDR must be a socket address like 0.0.0.0:8080")?;

        let admin_email = std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| {
            tracing::warn!("ADMIN_EMAIL not set; approval requests go to admin@localhost");
            "admin@localhost".to_string()
        });

        Ok(Self {
            bind_addr,
            admin_email,
            queue: QueueConfig::from_env(),
        })
    }
}
