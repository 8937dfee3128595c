//! Slack incoming-webhook notification channel.

use super::{ChannelError, ConfigField, FieldType, NotificationChannel};
use crate::notify::event::MonitoringEvent;

/// Posts event notifications to a Slack incoming webhook.
///
/// Config key: `webhookUrl`. The payload is `{"text": <message>}`.
pub struct SlackChannel {
    client: reqwest::Client,
}

impl SlackChannel {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn message(event: &MonitoringEvent) -> String {
        let name = event.service().display_name();
        let url = &event.service().url;
        let timestamp = event.timestamp();
        match event {
            MonitoringEvent::HealthChanged { .. } if event.went_down() => {
                format!(":red_circle: *Service DOWN:* {name} ({url})\n_{timestamp}_")
            }
            MonitoringEvent::HealthChanged { .. } => {
                format!(":large_green_circle: *Service UP:* {name} ({url})\n_{timestamp}_")
            }
            MonitoringEvent::ServiceAdded { .. } => {
                format!(":new: *Service Added:* {name} ({url})\n_{timestamp}_")
            }
            MonitoringEvent::ServiceRemoved { .. } => {
                format!(":wastebasket: *Service Removed:* {name} ({url})\n_{timestamp}_")
            }
        }
    }
}

#[async_trait::async_trait]
impl NotificationChannel for SlackChannel {
    fn channel_type(&self) -> &'static str {
        "SLACK"
    }

    fn display_name(&self) -> &'static str {
        "Slack"
    }

    async fn send(&self, event: &MonitoringEvent, config_json: &str) -> Result<(), ChannelError> {
        let config: serde_json::Value = serde_json::from_str(config_json)
            .map_err(|e| ChannelError::Config(e.to_string()))?;

        let webhook_url = config["webhookUrl"].as_str().unwrap_or("");
        if webhook_url.trim().is_empty() {
            tracing::debug!("Slack notification skipped: no webhookUrl configured");
            return Ok(());
        }

        let payload = serde_json::json!({ "text": Self::message(event) });
        let response = self
            .client
            .post(webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ChannelError::Webhook(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ChannelError::Webhook(format!(
                "webhook returned status {}",
                response.status()
            )));
        }

        tracing::info!(
            service = event.service().display_name(),
            "Slack notification sent"
        );
        Ok(())
    }

    fn validate(&self, config_json: &str) -> bool {
        match serde_json::from_str::<serde_json::Value>(config_json) {
            Ok(config) => {
                let webhook_url = config["webhookUrl"].as_str().unwrap_or("");
                !webhook_url.trim().is_empty() && webhook_url.starts_with("https://")
            }
            Err(_) => false,
        }
    }

    fn config_fields(&self) -> Vec<ConfigField> {
        vec![ConfigField {
            key: "webhookUrl",
            label: "Webhook URL",
            required: true,
            default_value: "",
            description: "Slack incoming webhook URL",
            field_type: FieldType::Secret,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{routing::post, Json, Router};
    use chrono::Utc;
    use parking_lot::Mutex;
    use tokio::net::TcpListener;

    use crate::model::MonitoredService;

    fn down_event() -> MonitoringEvent {
        let mut service = MonitoredService::new("http://svc-a");
        service.id = Some(1);
        service.name = Some("Accounts".to_string());
        MonitoringEvent::HealthChanged {
            service,
            previously_healthy: true,
            currently_healthy: false,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_validate_rejects_non_https_and_missing_key() {
        let channel = SlackChannel::new(reqwest::Client::new());

        assert!(channel.validate(r#"{"webhookUrl":"https://hooks.slack.com/services/T/B/x"}"#));
        assert!(!channel.validate(r#"{"webhookUrl":"http://hooks.slack.com/services/T/B/x"}"#));
        assert!(!channel.validate(r#"{"webhookUrl":""}"#));
        assert!(!channel.validate("{}"));
        assert!(!channel.validate("not json"));
    }

    #[test]
    fn test_message_markers_per_event_kind() {
        let mut service = MonitoredService::new("http://svc-a");
        service.id = Some(1);

        let added = MonitoringEvent::ServiceAdded {
            service: service.clone(),
            timestamp: Utc::now(),
        };
        let up = MonitoringEvent::HealthChanged {
            service,
            previously_healthy: false,
            currently_healthy: true,
            timestamp: Utc::now(),
        };

        assert!(SlackChannel::message(&down_event()).contains("*Service DOWN:* Accounts"));
        assert!(SlackChannel::message(&up).contains("*Service UP:*"));
        assert!(SlackChannel::message(&added).contains("*Service Added:*"));
    }

    #[tokio::test]
    async fn test_blank_webhook_url_skips_send() {
        let channel = SlackChannel::new(reqwest::Client::new());
        // No HTTP call is attempted, so this resolves without a server.
        channel
            .send(&down_event(), r#"{"webhookUrl":"  "}"#)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_send_posts_text_payload() {
        let received: Arc<Mutex<Vec<serde_json::Value>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let app = Router::new().route(
            "/hook",
            post(move |Json(body): Json<serde_json::Value>| {
                sink.lock().push(body);
                async { "ok" }
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let channel = SlackChannel::new(reqwest::Client::new());
        let config = format!(r#"{{"webhookUrl":"http://{addr}/hook"}}"#);
        channel.send(&down_event(), &config).await.unwrap();

        let bodies = received.lock();
        assert_eq!(bodies.len(), 1);
        let text = bodies[0]["text"].as_str().unwrap();
        assert!(text.contains("*Service DOWN:* Accounts"));
        assert!(text.contains("http://svc-a"));
    }

    #[tokio::test]
    async fn test_unreachable_webhook_is_an_error() {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(500))
            .build()
            .unwrap();
        let channel = SlackChannel::new(client);

        let result = channel
            .send(&down_event(), r#"{"webhookUrl":"http://127.0.0.1:1/hook"}"#)
            .await;
        assert!(matches!(result, Err(ChannelError::Webhook(_))));
    }
}
