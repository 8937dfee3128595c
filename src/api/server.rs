use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    delete_service_override, get_channel_config, health_check, list_channels, list_service_overrides,
    list_services, put_channel_config, put_service_override, register, remove_service, AppState,
};
use crate::monitor::MonitoringService;
use crate::notify::channel::{EmailChannel, LogMailer, NotificationChannel, SlackChannel};
use crate::notify::config::NotificationConfigService;
use crate::notify::dispatcher::NotificationDispatcher;
use crate::poller::StatusPoller;
use crate::scheduler::HealthCheckScheduler;
use crate::settings::AppSettings;
use crate::store::{InMemoryNotificationConfigStore, InMemoryServiceStore, InMemorySettingStore};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub poll_interval_secs: u64,
    pub poll_initial_delay_secs: u64,
    pub http_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            poll_interval_secs: 30,
            poll_initial_delay_secs: 10,
            http_timeout_secs: 10,
        }
    }
}

/// Build the application router
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Service registration
        .route("/register", post(register))
        .route("/services", get(list_services))
        .route("/services/:id", delete(remove_service))
        // Channel configuration
        .route("/channels", get(list_channels))
        .route(
            "/channels/:channel_type/config",
            get(get_channel_config).put(put_channel_config),
        )
        // Per-service overrides
        .route("/services/:id/overrides", get(list_service_overrides))
        .route(
            "/services/:id/overrides/:channel_type",
            put(put_service_override).delete(delete_service_override),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the monitoring server: HTTP API, health-check scheduler, and
/// notification dispatcher.
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Arc::new(AppSettings::new(Arc::new(InMemorySettingStore::new())));
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()?;

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let poller = StatusPoller::new(http_client.clone(), Arc::clone(&settings));
    let monitor = Arc::new(MonitoringService::new(
        Arc::new(InMemoryServiceStore::new()),
        poller,
        events_tx.clone(),
    ));

    let notification_config = Arc::new(NotificationConfigService::new(Arc::new(
        InMemoryNotificationConfigStore::new(),
    )));
    let channels: Vec<Arc<dyn NotificationChannel>> = vec![
        Arc::new(EmailChannel::new(Arc::new(LogMailer))),
        Arc::new(SlackChannel::new(http_client)),
    ];

    // Events flow through the dispatcher's own task so channel delivery
    // never holds up a poll cycle.
    let dispatcher = Arc::new(NotificationDispatcher::new(
        channels.clone(),
        Arc::clone(&notification_config),
    ));
    let dispatcher_handle = tokio::spawn(Arc::clone(&dispatcher).run(events_rx));

    let mut scheduler = HealthCheckScheduler::new(
        Arc::clone(&monitor),
        events_tx,
        Duration::from_secs(config.poll_interval_secs),
        Duration::from_secs(config.poll_initial_delay_secs),
    );
    let scheduler_handle = scheduler.start();

    let state = Arc::new(AppState {
        monitor,
        config: notification_config,
        channels,
    });
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Starting BootGuard server on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop().await;
    let _ = scheduler_handle.await;
    dispatcher_handle.abort();

    tracing::info!("BootGuard server stopped");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
    tracing::info!("Shutdown signal received, stopping scheduler...");
}
