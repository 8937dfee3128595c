//! Pluggable notification channels.
//!
//! The dispatcher is closed over this trait: adding a delivery mechanism
//! means implementing it and registering the instance at startup.

mod email;
mod slack;

pub use email::{EmailChannel, LogMailer, MailMessage, MailSender};
pub use slack::SlackChannel;

use serde::Serialize;

use crate::notify::event::MonitoringEvent;

/// Channel delivery errors. The dispatcher logs these; they never reach the
/// event's originator.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("invalid channel config: {0}")]
    Config(String),
    #[error("mail delivery failed: {0}")]
    Mail(String),
    #[error("webhook delivery failed: {0}")]
    Webhook(String),
}

/// How a config field should be rendered and edited by a UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    Text,
    EmailList,
    Secret,
}

/// Descriptor of one key in a channel's config blob. The core never
/// interprets labels or descriptions; they exist for form rendering.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigField {
    pub key: &'static str,
    pub label: &'static str,
    pub required: bool,
    pub default_value: &'static str,
    pub description: &'static str,
    pub field_type: FieldType,
}

/// A notification delivery mechanism.
#[async_trait::async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Stable identifier used as the configuration key (e.g. "EMAIL").
    fn channel_type(&self) -> &'static str;

    /// Human-readable name for configuration UIs.
    fn display_name(&self) -> &'static str;

    /// Deliver an event using the given config blob. Implementations skip
    /// silently when the config leaves them unaddressed (e.g. no
    /// recipients); delivery failures surface as errors for the dispatcher
    /// to log.
    async fn send(&self, event: &MonitoringEvent, config_json: &str) -> Result<(), ChannelError>;

    /// Whether a config blob is acceptable for this channel.
    fn validate(&self, config_json: &str) -> bool;

    /// Ordered field descriptors for the config blob.
    fn config_fields(&self) -> Vec<ConfigField>;
}
