//! BootGuard Server
//!
//! Run with: cargo run
//!
//! Environment variables:
//! - BOOTGUARD_HOST: Bind address (default: 0.0.0.0)
//! - BOOTGUARD_PORT: Port number (default: 8080)
//! - BOOTGUARD_POLL_INTERVAL_SECS: Seconds between health-check cycles (default: 30)
//! - BOOTGUARD_POLL_INITIAL_DELAY_SECS: Delay before the first cycle (default: 10)
//! - BOOTGUARD_HTTP_TIMEOUT_SECS: Per-request timeout for status fetches (default: 10)
//! - RUST_LOG: Log level (default: info)

use bootguard::api::{run_server, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bootguard=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let defaults = ServerConfig::default();
    let config = ServerConfig {
        host: std::env::var("BOOTGUARD_HOST").unwrap_or(defaults.host),
        port: std::env::var("BOOTGUARD_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port),
        poll_interval_secs: std::env::var("BOOTGUARD_POLL_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.poll_interval_secs),
        poll_initial_delay_secs: std::env::var("BOOTGUARD_POLL_INITIAL_DELAY_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.poll_initial_delay_secs),
        http_timeout_secs: std::env::var("BOOTGUARD_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.http_timeout_secs),
    };

    tracing::info!("BootGuard configuration:");
    tracing::info!("  Host: {}:{}", config.host, config.port);
    tracing::info!("  Poll interval: {} seconds", config.poll_interval_secs);
    tracing::info!(
        "  Poll initial delay: {} seconds",
        config.poll_initial_delay_secs
    );
    tracing::info!("  HTTP timeout: {} seconds", config.http_timeout_secs);

    run_server(config).await
}
