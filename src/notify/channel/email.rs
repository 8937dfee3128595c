//! Email notification channel.

use std::sync::Arc;

use super::{ChannelError, ConfigField, FieldType, NotificationChannel};
use crate::notify::event::MonitoringEvent;

pub const DEFAULT_FROM_ADDRESS: &str = "bootguard@localhost";
pub const DEFAULT_SUBJECT_PREFIX: &str = "[BootGuard]";

/// A composed message handed to the mail collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Outbound mail collaborator. SMTP delivery lives behind this seam.
#[async_trait::async_trait]
pub trait MailSender: Send + Sync {
    async fn deliver(&self, message: MailMessage) -> Result<(), ChannelError>;
}

/// Mailer that records deliveries in the log only. Stands in wherever no
/// SMTP relay is wired up.
pub struct LogMailer;

#[async_trait::async_trait]
impl MailSender for LogMailer {
    async fn deliver(&self, message: MailMessage) -> Result<(), ChannelError> {
        tracing::info!(
            to = message.to.join(",").as_str(),
            subject = message.subject.as_str(),
            "Mail delivery (log only): {}",
            message.body
        );
        Ok(())
    }
}

/// Sends event notifications by email.
///
/// Config keys: `recipients` (comma-separated, blank skips delivery),
/// `fromAddress`, `subjectPrefix`.
pub struct EmailChannel {
    mailer: Arc<dyn MailSender>,
}

impl EmailChannel {
    pub fn new(mailer: Arc<dyn MailSender>) -> Self {
        Self { mailer }
    }

    fn subject(event: &MonitoringEvent, prefix: &str) -> String {
        let name = event.service().display_name();
        match event {
            MonitoringEvent::HealthChanged { .. } if event.went_down() => {
                format!("{prefix} Service DOWN: {name}")
            }
            MonitoringEvent::HealthChanged { .. } => format!("{prefix} Service UP: {name}"),
            MonitoringEvent::ServiceAdded { .. } => format!("{prefix} Service Added: {name}"),
            MonitoringEvent::ServiceRemoved { .. } => format!("{prefix} Service Removed: {name}"),
        }
    }

    fn body(event: &MonitoringEvent) -> String {
        let name = event.service().display_name();
        let url = &event.service().url;
        let timestamp = event.timestamp();
        match event {
            MonitoringEvent::HealthChanged { .. } if event.went_down() => {
                format!("Service '{name}' ({url}) is now DOWN.\nDetected at: {timestamp}")
            }
            MonitoringEvent::HealthChanged { .. } => {
                format!("Service '{name}' ({url}) is now UP.\nDetected at: {timestamp}")
            }
            MonitoringEvent::ServiceAdded { .. } => {
                format!("Service '{name}' ({url}) has been added to monitoring.\nAdded at: {timestamp}")
            }
            MonitoringEvent::ServiceRemoved { .. } => {
                format!("Service '{name}' ({url}) has been removed from monitoring.\nRemoved at: {timestamp}")
            }
        }
    }
}

#[async_trait::async_trait]
impl NotificationChannel for EmailChannel {
    fn channel_type(&self) -> &'static str {
        "EMAIL"
    }

    fn display_name(&self) -> &'static str {
        "Email"
    }

    async fn send(&self, event: &MonitoringEvent, config_json: &str) -> Result<(), ChannelError> {
        let config: serde_json::Value = serde_json::from_str(config_json)
            .map_err(|e| ChannelError::Config(e.to_string()))?;

        let recipients = config["recipients"].as_str().unwrap_or("");
        if recipients.trim().is_empty() {
            tracing::debug!("Email notification skipped: no recipients configured");
            return Ok(());
        }

        let from = config["fromAddress"]
            .as_str()
            .unwrap_or(DEFAULT_FROM_ADDRESS)
            .to_string();
        let prefix = config["subjectPrefix"]
            .as_str()
            .unwrap_or(DEFAULT_SUBJECT_PREFIX);

        let to: Vec<String> = recipients
            .split(',')
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();

        let message = MailMessage {
            from,
            to,
            subject: Self::subject(event, prefix),
            body: Self::body(event),
        };

        self.mailer.deliver(message).await?;
        tracing::info!(
            service = event.service().display_name(),
            recipients,
            "Email notification sent"
        );
        Ok(())
    }

    fn validate(&self, config_json: &str) -> bool {
        match serde_json::from_str::<serde_json::Value>(config_json) {
            Ok(config) => config.get("recipients").is_some() && config.get("fromAddress").is_some(),
            Err(_) => false,
        }
    }

    fn config_fields(&self) -> Vec<ConfigField> {
        vec![
            ConfigField {
                key: "recipients",
                label: "Recipients",
                required: true,
                default_value: "",
                description: "Comma-separated list of recipient addresses",
                field_type: FieldType::EmailList,
            },
            ConfigField {
                key: "fromAddress",
                label: "From address",
                required: true,
                default_value: DEFAULT_FROM_ADDRESS,
                description: "Sender address for outgoing notifications",
                field_type: FieldType::Text,
            },
            ConfigField {
                key: "subjectPrefix",
                label: "Subject prefix",
                required: false,
                default_value: DEFAULT_SUBJECT_PREFIX,
                description: "Prefix prepended to every notification subject",
                field_type: FieldType::Text,
            },
        ]
    }
}
