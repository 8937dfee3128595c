//! Persistence collaborators.
//!
//! The core never talks to a database directly; it reads and writes through
//! the narrow traits defined here and in the modules owning the stored types.
//! [`memory`] provides the in-process implementations used by the server
//! wiring and by tests.

pub mod memory;

pub use memory::{InMemoryNotificationConfigStore, InMemoryServiceStore, InMemorySettingStore};

use crate::model::{MonitoredService, ServiceId};

/// Store of registered services.
pub trait ServiceStore: Send + Sync {
    fn find_all(&self) -> Vec<MonitoredService>;

    fn find(&self, id: ServiceId) -> Option<MonitoredService>;

    fn exists_by_url(&self, url: &str) -> bool;

    /// Persist a service, assigning an id on first save. Returns the stored
    /// record with its id populated.
    fn save(&self, service: MonitoredService) -> MonitoredService;

    /// Write back an existing record only while its id is still present.
    /// Returns false for an unsaved service or one deleted in the meantime;
    /// nothing is re-inserted in either case.
    fn update(&self, service: MonitoredService) -> bool;

    fn delete(&self, id: ServiceId);
}
