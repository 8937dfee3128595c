//! Periodic health-check driver.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

use crate::monitor::MonitoringService;
use crate::notify::event::MonitoringEvent;
use crate::notify::transition::TransitionTracker;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(10);

/// Drives one poll cycle per tick: refresh every service, hand the complete
/// batch to the transition tracker, and push resulting events onto the
/// dispatcher's channel. Event delivery happens on the dispatcher's own
/// task, so a slow channel never delays the next tick; an overrunning cycle
/// pushes the next tick back rather than bursting.
pub struct HealthCheckScheduler {
    monitor: Arc<MonitoringService>,
    tracker: Arc<TransitionTracker>,
    events: mpsc::UnboundedSender<MonitoringEvent>,
    poll_interval: Duration,
    initial_delay: Duration,
    shutdown_tx: Option<mpsc::Sender<()>>,
}

impl HealthCheckScheduler {
    pub fn new(
        monitor: Arc<MonitoringService>,
        events: mpsc::UnboundedSender<MonitoringEvent>,
        poll_interval: Duration,
        initial_delay: Duration,
    ) -> Self {
        Self {
            monitor,
            tracker: Arc::new(TransitionTracker::new()),
            events,
            poll_interval,
            initial_delay,
            shutdown_tx: None,
        }
    }

    /// Start the background driver.
    pub fn start(&mut self) -> tokio::task::JoinHandle<()> {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        self.shutdown_tx = Some(shutdown_tx);

        let monitor = Arc::clone(&self.monitor);
        let tracker = Arc::clone(&self.tracker);
        let events = self.events.clone();
        let poll_interval = self.poll_interval;
        let initial_delay = self.initial_delay;

        tokio::spawn(async move {
            tokio::time::sleep(initial_delay).await;

            let mut ticker = interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        run_cycle(&monitor, &tracker, &events).await;
                    }
                    _ = shutdown_rx.recv() => {
                        tracing::info!("Health check scheduler shutting down");
                        break;
                    }
                }
            }
        })
    }

    /// Stop the background driver.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
        }
    }

    /// Run one cycle immediately. Exposed for tests and manual refresh.
    pub async fn run_cycle(&self) {
        run_cycle(&self.monitor, &self.tracker, &self.events).await;
    }
}

async fn run_cycle(
    monitor: &Arc<MonitoringService>,
    tracker: &Arc<TransitionTracker>,
    events: &mpsc::UnboundedSender<MonitoringEvent>,
) {
    let batch = monitor.refresh_all().await;
    tracing::debug!(services = batch.len(), "Poll cycle complete");

    for event in tracker.observe(&batch) {
        monitor.notify_listeners(event.service());
        if events.send(event).is_err() {
            tracing::debug!("Event channel closed, dropping health change event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use axum::{routing::get, Json, Router};
    use parking_lot::Mutex;
    use tokio::net::TcpListener;

    use crate::notify::channel::{ChannelError, ConfigField, NotificationChannel};
    use crate::notify::config::{ChannelConfig, NotificationConfigService};
    use crate::notify::dispatcher::NotificationDispatcher;
    use crate::poller::StatusPoller;
    use crate::settings::AppSettings;
    use crate::store::{
        InMemoryNotificationConfigStore, InMemoryServiceStore, InMemorySettingStore,
    };

    struct RecordingChannel {
        channel_type: &'static str,
        sent: Mutex<Vec<(String, String)>>,
    }

    impl RecordingChannel {
        fn new(channel_type: &'static str) -> Arc<Self> {
            Arc::new(Self {
                channel_type,
                sent: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl NotificationChannel for RecordingChannel {
        fn channel_type(&self) -> &'static str {
            self.channel_type
        }

        fn display_name(&self) -> &'static str {
            self.channel_type
        }

        async fn send(&self, event: &MonitoringEvent, config_json: &str) -> Result<(), ChannelError> {
            self.sent
                .lock()
                .push((format!("{event:?}"), config_json.to_string()));
            Ok(())
        }

        fn validate(&self, _config_json: &str) -> bool {
            true
        }

        fn config_fields(&self) -> Vec<ConfigField> {
            Vec::new()
        }
    }

    /// Target that can be flipped between healthy and unreachable-ish
    /// (health endpoint returns a DOWN status).
    async fn spawn_toggleable_target(healthy: Arc<AtomicBool>) -> String {
        let app = Router::new()
            .route(
                "/actuator/info",
                get(|| async { Json(serde_json::json!({"name": "svc-a", "version": "1.0"})) }),
            )
            .route(
                "/actuator/health",
                get(move || async move {
                    let status = if healthy.load(Ordering::SeqCst) { "UP" } else { "DOWN" };
                    Json(serde_json::json!({"status": status}))
                }),
            );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_end_to_end_down_transition_reaches_enabled_channel_only() {
        let healthy = Arc::new(AtomicBool::new(true));
        let url = spawn_toggleable_target(Arc::clone(&healthy)).await;

        let settings = Arc::new(AppSettings::new(Arc::new(InMemorySettingStore::new())));
        let poller = StatusPoller::with_timeout(Duration::from_millis(800), settings).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let monitor = Arc::new(MonitoringService::new(
            Arc::new(InMemoryServiceStore::new()),
            poller,
            tx.clone(),
        ));

        let config = Arc::new(NotificationConfigService::new(Arc::new(
            InMemoryNotificationConfigStore::new(),
        )));
        config.save_global_config(ChannelConfig::new(
            "EMAIL",
            true,
            r#"{"recipients":"ops@acme.io","fromAddress":"mon@acme.io"}"#,
        ));
        config.save_global_config(ChannelConfig::new("SLACK", false, "{}"));

        let email = RecordingChannel::new("EMAIL");
        let slack = RecordingChannel::new("SLACK");
        let dispatcher =
            NotificationDispatcher::new(vec![email.clone(), slack.clone()], config);

        let service = monitor.register(&url).await.unwrap();
        assert_eq!(service.id, Some(1));
        // Registration itself publishes ServiceAdded.
        assert!(matches!(
            rx.recv().await.unwrap(),
            MonitoringEvent::ServiceAdded { .. }
        ));

        let scheduler = HealthCheckScheduler::new(
            Arc::clone(&monitor),
            tx,
            DEFAULT_POLL_INTERVAL,
            Duration::ZERO,
        );

        // First cycle: healthy, first observation, no event.
        scheduler.run_cycle().await;
        assert!(rx.try_recv().is_err());
        assert!(monitor.services()[0].health_ok);

        // Target goes down; the next cycle emits exactly one transition.
        healthy.store(false, Ordering::SeqCst);
        scheduler.run_cycle().await;

        let event = rx.try_recv().unwrap();
        assert!(event.went_down());
        assert_eq!(event.service().id, Some(1));
        assert!(rx.try_recv().is_err());

        // Only the enabled channel delivers, with the resolved config.
        dispatcher.dispatch(&event).await;
        let email_sent = email.sent.lock();
        assert_eq!(email_sent.len(), 1);
        assert!(email_sent[0].1.contains("ops@acme.io"));
        assert!(slack.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn test_stable_cycles_emit_no_events() {
        let healthy = Arc::new(AtomicBool::new(true));
        let url = spawn_toggleable_target(Arc::clone(&healthy)).await;

        let settings = Arc::new(AppSettings::new(Arc::new(InMemorySettingStore::new())));
        let poller = StatusPoller::with_timeout(Duration::from_millis(800), settings).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let monitor = Arc::new(MonitoringService::new(
            Arc::new(InMemoryServiceStore::new()),
            poller,
            tx.clone(),
        ));
        monitor.register(&url).await.unwrap();
        let _ = rx.recv().await;

        let scheduler = HealthCheckScheduler::new(
            Arc::clone(&monitor),
            tx,
            DEFAULT_POLL_INTERVAL,
            Duration::ZERO,
        );

        scheduler.run_cycle().await;
        scheduler.run_cycle().await;
        scheduler.run_cycle().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_start_and_stop_background_driver() {
        let settings = Arc::new(AppSettings::new(Arc::new(InMemorySettingStore::new())));
        let poller = StatusPoller::with_timeout(Duration::from_millis(200), settings).unwrap();
        let (tx, _rx) = mpsc::unbounded_channel();
        let monitor = Arc::new(MonitoringService::new(
            Arc::new(InMemoryServiceStore::new()),
            poller,
            tx.clone(),
        ));

        let mut scheduler = HealthCheckScheduler::new(
            monitor,
            tx,
            Duration::from_millis(50),
            Duration::ZERO,
        );
        let handle = scheduler.start();
        tokio::time::sleep(Duration::from_millis(20)).await;
        scheduler.stop().await;

        handle.await.unwrap();
    }
}
