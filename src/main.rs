//! pircd - a minimal line-oriented IRC chat relay.
//!
//! One router task owns every shared directory; connections talk to it
//! over bounded queues.

mod config;
mod network;
mod router;
mod session;

use crate::config::Config;
use crate::network::Gateway;
use crate::router::Router;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    info!(server = %config.server.name, "Starting pircd");

    let (router_handle, router) = Router::new(config.server.name.clone());
    tokio::spawn(router.run());

    let gateway = Gateway::bind(config.listen.address, router_handle).await?;
    gateway.run().await
}
