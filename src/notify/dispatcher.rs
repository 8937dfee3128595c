//! Event fan-out to notification channels.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::notify::channel::NotificationChannel;
use crate::notify::config::NotificationConfigService;
use crate::notify::event::MonitoringEvent;

/// Routes monitoring events to every enabled channel, one at a time in
/// registration order. A channel failure is logged and the remaining
/// channels still get their attempt; partial delivery is terminal.
pub struct NotificationDispatcher {
    channels: Vec<Arc<dyn NotificationChannel>>,
    config: Arc<NotificationConfigService>,
}

impl NotificationDispatcher {
    pub fn new(
        channels: Vec<Arc<dyn NotificationChannel>>,
        config: Arc<NotificationConfigService>,
    ) -> Self {
        Self { channels, config }
    }

    pub async fn dispatch(&self, event: &MonitoringEvent) {
        let Some(service_id) = event.service().id else {
            tracing::warn!(
                service = event.service().url.as_str(),
                "Dropping event for unsaved service"
            );
            return;
        };

        for channel in &self.channels {
            let channel_type = channel.channel_type();
            if !self.config.is_enabled_for_service(channel_type, service_id) {
                tracing::debug!(
                    channel = channel_type,
                    service_id,
                    "Channel disabled for service, skipping"
                );
                continue;
            }

            let config_json = self.config.effective_config_json(channel_type, service_id);
            if let Err(e) = channel.send(event, &config_json).await {
                tracing::error!(
                    channel = channel_type,
                    service_id,
                    error = %e,
                    "Error dispatching notification"
                );
            }
        }
    }

    /// Consume events until the sending side closes. Run in a spawned task
    /// so delivery never holds up the poll cycle that produced the event.
    pub async fn run(self: Arc<Self>, mut events: mpsc::UnboundedReceiver<MonitoringEvent>) {
        while let Some(event) = events.recv().await {
            self.dispatch(&event).await;
        }
        tracing::info!("Notification dispatcher stopped");
    }
}
