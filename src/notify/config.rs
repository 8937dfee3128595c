//! Notification channel configuration and override resolution.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::model::ServiceId;

/// Global configuration for one channel type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub channel_type: String,
    pub enabled: bool,
    /// Opaque channel-specific config blob, interpreted only by the channel.
    pub config_json: String,
}

impl ChannelConfig {
    pub fn new(channel_type: impl Into<String>, enabled: bool, config_json: impl Into<String>) -> Self {
        Self {
            channel_type: channel_type.into(),
            enabled,
            config_json: config_json.into(),
        }
    }
}

/// Per-service override of a channel's global configuration.
///
/// `enabled: None` means "inherit" the global flag; a blank or absent
/// `config_json` defers to the global blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelOverride {
    pub service_id: ServiceId,
    pub channel_type: String,
    pub enabled: Option<bool>,
    pub config_json: Option<String>,
}

impl ChannelOverride {
    pub fn new(service_id: ServiceId, channel_type: impl Into<String>) -> Self {
        Self {
            service_id,
            channel_type: channel_type.into(),
            enabled: None,
            config_json: None,
        }
    }
}

/// Store of channel configuration, keyed by channel type globally and by
/// (service id, channel type) for overrides. Overrides are unique per pair.
pub trait NotificationConfigStore: Send + Sync {
    fn find_global(&self, channel_type: &str) -> Option<ChannelConfig>;

    fn save_global(&self, config: ChannelConfig) -> ChannelConfig;

    fn find_override(&self, service_id: ServiceId, channel_type: &str) -> Option<ChannelOverride>;

    fn save_override(&self, service_override: ChannelOverride) -> ChannelOverride;

    fn delete_override(&self, service_id: ServiceId, channel_type: &str);

    fn list_overrides(&self, service_id: ServiceId) -> Vec<ChannelOverride>;
}

/// Resolves the effective per-channel configuration for a service: a
/// per-service override wins over the global config, which wins over the
/// disabled/empty defaults.
pub struct NotificationConfigService {
    store: Arc<dyn NotificationConfigStore>,
}

impl NotificationConfigService {
    pub fn new(store: Arc<dyn NotificationConfigStore>) -> Self {
        Self { store }
    }

    /// Whether a channel should deliver for this service. An override with a
    /// non-inherit enabled flag is authoritative; otherwise the global flag
    /// decides, and a missing global config means disabled.
    pub fn is_enabled_for_service(&self, channel_type: &str, service_id: ServiceId) -> bool {
        if let Some(enabled) = self
            .store
            .find_override(service_id, channel_type)
            .and_then(|o| o.enabled)
        {
            return enabled;
        }

        self.store
            .find_global(channel_type)
            .map(|c| c.enabled)
            .unwrap_or(false)
    }

    /// Effective config blob for this (channel, service). A present-but-blank
    /// override blob is treated as no override.
    pub fn effective_config_json(&self, channel_type: &str, service_id: ServiceId) -> String {
        if let Some(config_json) = self
            .store
            .find_override(service_id, channel_type)
            .and_then(|o| o.config_json)
        {
            if !config_json.trim().is_empty() {
                return config_json;
            }
        }

        self.store
            .find_global(channel_type)
            .map(|c| c.config_json)
            .unwrap_or_else(|| "{}".to_string())
    }

    pub fn global_config(&self, channel_type: &str) -> Option<ChannelConfig> {
        self.store.find_global(channel_type)
    }

    pub fn save_global_config(&self, config: ChannelConfig) -> ChannelConfig {
        self.store.save_global(config)
    }

    pub fn service_override(&self, service_id: ServiceId, channel_type: &str) -> Option<ChannelOverride> {
        self.store.find_override(service_id, channel_type)
    }

    pub fn save_override(&self, service_override: ChannelOverride) -> ChannelOverride {
        self.store.save_override(service_override)
    }

    pub fn delete_override(&self, service_id: ServiceId, channel_type: &str) {
        self.store.delete_override(service_id, channel_type);
    }

    pub fn overrides_for_service(&self, service_id: ServiceId) -> Vec<ChannelOverride> {
        self.store.list_overrides(service_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryNotificationConfigStore;

    fn service() -> NotificationConfigService {
        NotificationConfigService::new(Arc::new(InMemoryNotificationConfigStore::new()))
    }

    #[test]
    fn test_absent_global_config_is_disabled() {
        assert!(!service().is_enabled_for_service("EMAIL", 1));
    }

    #[test]
    fn test_global_flag_applies_without_override() {
        let config = service();
        config.save_global_config(ChannelConfig::new("EMAIL", true, "{}"));
        assert!(config.is_enabled_for_service("EMAIL", 1));

        config.save_global_config(ChannelConfig::new("EMAIL", false, "{}"));
        assert!(!config.is_enabled_for_service("EMAIL", 1));
    }

    #[test]
    fn test_override_enabled_wins_over_global_disabled() {
        let config = service();
        config.save_global_config(ChannelConfig::new("EMAIL", false, "{}"));

        let mut o = ChannelOverride::new(1, "EMAIL");
        o.enabled = Some(true);
        config.save_override(o);

        assert!(config.is_enabled_for_service("EMAIL", 1));
        // Other services still follow the global flag.
        assert!(!config.is_enabled_for_service("EMAIL", 2));
    }

    #[test]
    fn test_override_disabled_wins_over_global_enabled() {
        let config = service();
        config.save_global_config(ChannelConfig::new("SLACK", true, "{}"));

        let mut o = ChannelOverride::new(1, "SLACK");
        o.enabled = Some(false);
        config.save_override(o);

        assert!(!config.is_enabled_for_service("SLACK", 1));
    }

    #[test]
    fn test_inherit_falls_through_to_global() {
        let config = service();
        config.save_global_config(ChannelConfig::new("EMAIL", true, "{}"));

        // Override present but enabled unset.
        config.save_override(ChannelOverride::new(1, "EMAIL"));

        assert!(config.is_enabled_for_service("EMAIL", 1));
    }

    #[test]
    fn test_effective_config_prefers_override_blob() {
        let config = service();
        config.save_global_config(ChannelConfig::new("EMAIL", true, r#"{"recipients":"ops@acme"}"#));

        let mut o = ChannelOverride::new(1, "EMAIL");
        o.config_json = Some(r#"{"recipients":"oncall@acme"}"#.to_string());
        config.save_override(o);

        assert_eq!(
            config.effective_config_json("EMAIL", 1),
            r#"{"recipients":"oncall@acme"}"#
        );
        assert_eq!(
            config.effective_config_json("EMAIL", 2),
            r#"{"recipients":"ops@acme"}"#
        );
    }

    #[test]
    fn test_blank_override_blob_is_no_override() {
        let config = service();
        config.save_global_config(ChannelConfig::new("EMAIL", true, r#"{"recipients":"ops@acme"}"#));

        let mut o = ChannelOverride::new(1, "EMAIL");
        o.config_json = Some("   ".to_string());
        config.save_override(o);

        assert_eq!(
            config.effective_config_json("EMAIL", 1),
            r#"{"recipients":"ops@acme"}"#
        );
    }

    #[test]
    fn test_absent_global_blob_is_empty_object() {
        assert_eq!(service().effective_config_json("SLACK", 9), "{}");
    }

    #[test]
    fn test_override_crud() {
        let config = service();
        let mut o = ChannelOverride::new(4, "SLACK");
        o.enabled = Some(true);
        config.save_override(o);

        assert!(config.service_override(4, "SLACK").is_some());
        assert_eq!(config.overrides_for_service(4).len(), 1);

        config.delete_override(4, "SLACK");
        assert!(config.service_override(4, "SLACK").is_none());
    }
}
