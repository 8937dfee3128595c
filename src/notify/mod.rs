//! Notification pipeline: events, transition detection, configuration
//! resolution, channels, and dispatch.

pub mod channel;
pub mod config;
pub mod dispatcher;
pub mod event;
pub mod transition;

pub use channel::{ChannelError, ConfigField, FieldType, NotificationChannel};
pub use config::{ChannelConfig, ChannelOverride, NotificationConfigService, NotificationConfigStore};
pub use dispatcher::NotificationDispatcher;
pub use event::MonitoringEvent;
pub use transition::TransitionTracker;
