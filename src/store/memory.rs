//! In-memory store implementations.
//!
//! Concurrent maps keyed the same way a relational schema would be: services
//! by id, global channel configs by channel type, overrides by
//! (service id, channel type), settings by key.

use std::sync::atomic::{AtomicI64, Ordering};

use dashmap::DashMap;

use super::ServiceStore;
use crate::model::{MonitoredService, ServiceId};
use crate::notify::config::{ChannelConfig, ChannelOverride, NotificationConfigStore};
use crate::settings::SettingStore;

/// Service store over a concurrent map, with ids handed out sequentially.
pub struct InMemoryServiceStore {
    services: DashMap<ServiceId, MonitoredService>,
    next_id: AtomicI64,
}

impl InMemoryServiceStore {
    pub fn new() -> Self {
        Self {
            services: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for InMemoryServiceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceStore for InMemoryServiceStore {
    fn find_all(&self) -> Vec<MonitoredService> {
        let mut services: Vec<MonitoredService> =
            self.services.iter().map(|e| e.value().clone()).collect();
        services.sort_by_key(|s| s.id);
        services
    }

    fn find(&self, id: ServiceId) -> Option<MonitoredService> {
        self.services.get(&id).map(|e| e.value().clone())
    }

    fn exists_by_url(&self, url: &str) -> bool {
        self.services.iter().any(|e| e.value().url == url)
    }

    fn save(&self, mut service: MonitoredService) -> MonitoredService {
        let id = match service.id {
            Some(id) => id,
            None => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                service.id = Some(id);
                id
            }
        };
        self.services.insert(id, service.clone());
        service
    }

    fn update(&self, service: MonitoredService) -> bool {
        let Some(id) = service.id else {
            return false;
        };
        match self.services.get_mut(&id) {
            Some(mut existing) => {
                *existing = service;
                true
            }
            None => false,
        }
    }

    fn delete(&self, id: ServiceId) {
        self.services.remove(&id);
    }
}

/// Channel configuration store.
pub struct InMemoryNotificationConfigStore {
    globals: DashMap<String, ChannelConfig>,
    overrides: DashMap<(ServiceId, String), ChannelOverride>,
}

impl InMemoryNotificationConfigStore {
    pub fn new() -> Self {
        Self {
            globals: DashMap::new(),
            overrides: DashMap::new(),
        }
    }
}

impl Default for InMemoryNotificationConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationConfigStore for InMemoryNotificationConfigStore {
    fn find_global(&self, channel_type: &str) -> Option<ChannelConfig> {
        self.globals.get(channel_type).map(|e| e.value().clone())
    }

    fn save_global(&self, config: ChannelConfig) -> ChannelConfig {
        self.globals.insert(config.channel_type.clone(), config.clone());
        config
    }

    fn find_override(&self, service_id: ServiceId, channel_type: &str) -> Option<ChannelOverride> {
        self.overrides
            .get(&(service_id, channel_type.to_string()))
            .map(|e| e.value().clone())
    }

    fn save_override(&self, service_override: ChannelOverride) -> ChannelOverride {
        self.overrides.insert(
            (
                service_override.service_id,
                service_override.channel_type.clone(),
            ),
            service_override.clone(),
        );
        service_override
    }

    fn delete_override(&self, service_id: ServiceId, channel_type: &str) {
        self.overrides.remove(&(service_id, channel_type.to_string()));
    }

    fn list_overrides(&self, service_id: ServiceId) -> Vec<ChannelOverride> {
        let mut overrides: Vec<ChannelOverride> = self
            .overrides
            .iter()
            .filter(|e| e.key().0 == service_id)
            .map(|e| e.value().clone())
            .collect();
        overrides.sort_by(|a, b| a.channel_type.cmp(&b.channel_type));
        overrides
    }
}

/// Setting store.
pub struct InMemorySettingStore {
    settings: DashMap<String, String>,
}

impl InMemorySettingStore {
    pub fn new() -> Self {
        Self {
            settings: DashMap::new(),
        }
    }
}

impl Default for InMemorySettingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingStore for InMemorySettingStore {
    fn get(&self, key: &str) -> Option<String> {
        self.settings.get(key).map(|e| e.value().clone())
    }

    fn set(&self, key: &str, value: &str) {
        self.settings.insert(key.to_string(), value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_assigns_sequential_ids() {
        let store = InMemoryServiceStore::new();
        let a = store.save(MonitoredService::new("http://svc-a"));
        let b = store.save(MonitoredService::new("http://svc-b"));

        assert_eq!(a.id, Some(1));
        assert_eq!(b.id, Some(2));
        assert_eq!(store.find_all().len(), 2);
    }

    #[test]
    fn test_save_existing_keeps_id() {
        let store = InMemoryServiceStore::new();
        let mut service = store.save(MonitoredService::new("http://svc-a"));
        service.health_ok = true;

        let saved = store.save(service);
        assert_eq!(saved.id, Some(1));
        assert!(store.find(1).unwrap().health_ok);
        assert_eq!(store.find_all().len(), 1);
    }

    #[test]
    fn test_exists_by_url() {
        let store = InMemoryServiceStore::new();
        store.save(MonitoredService::new("http://svc-a"));

        assert!(store.exists_by_url("http://svc-a"));
        assert!(!store.exists_by_url("http://svc-b"));
    }

    #[test]
    fn test_delete() {
        let store = InMemoryServiceStore::new();
        let service = store.save(MonitoredService::new("http://svc-a"));
        store.delete(service.id.unwrap());

        assert!(store.find_all().is_empty());
        assert!(!store.exists_by_url("http://svc-a"));
    }

    #[test]
    fn test_update_refuses_deleted_or_unsaved_records() {
        let store = InMemoryServiceStore::new();
        let mut service = store.save(MonitoredService::new("http://svc-a"));
        service.health_ok = true;

        assert!(store.update(service.clone()));
        assert!(store.find(1).unwrap().health_ok);

        store.delete(1);
        assert!(!store.update(service));
        assert!(store.find_all().is_empty());

        assert!(!store.update(MonitoredService::new("http://svc-b")));
        assert!(store.find_all().is_empty());
    }

    #[test]
    fn test_override_unique_per_service_and_channel() {
        let store = InMemoryNotificationConfigStore::new();
        let mut first = ChannelOverride::new(1, "EMAIL");
        first.enabled = Some(false);
        store.save_override(first);

        let mut second = ChannelOverride::new(1, "EMAIL");
        second.enabled = Some(true);
        store.save_override(second);

        assert_eq!(store.list_overrides(1).len(), 1);
        assert_eq!(store.find_override(1, "EMAIL").unwrap().enabled, Some(true));
    }
}
