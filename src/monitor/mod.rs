//! Service registry: registration, removal, listener notification, and the
//! poll-and-persist cycle body.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::model::{MonitoredService, ServiceId};
use crate::notify::event::MonitoringEvent;
use crate::poller::StatusPoller;
use crate::store::ServiceStore;

type Listener = Box<dyn Fn(&MonitoredService) + Send + Sync>;

/// Rejected registration input. Surfaced synchronously; nothing is stored.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("url must not be blank")]
    BlankUrl,
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("unsupported scheme '{0}': only http and https endpoints can be monitored")]
    UnsupportedScheme(String),
    #[error("a service with this url is already registered")]
    DuplicateUrl,
}

/// Owns the registered-service lifecycle and fans poll results out to UI
/// listeners and the notification event channel.
pub struct MonitoringService {
    store: Arc<dyn ServiceStore>,
    poller: StatusPoller,
    events: mpsc::UnboundedSender<MonitoringEvent>,
    listeners: RwLock<Vec<Listener>>,
}

impl MonitoringService {
    pub fn new(
        store: Arc<dyn ServiceStore>,
        poller: StatusPoller,
        events: mpsc::UnboundedSender<MonitoringEvent>,
    ) -> Self {
        Self {
            store,
            poller,
            events,
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Register a service by URL with the default actuator endpoints.
    pub async fn register(&self, url: &str) -> Result<MonitoredService, RegistrationError> {
        self.register_with_endpoints(url, None, None).await
    }

    /// Register a service, optionally overriding the info/health paths.
    /// Blank overrides keep the defaults. A best-effort info fetch fills in
    /// name/version before the first poll cycle; its failure is not an error.
    pub async fn register_with_endpoints(
        &self,
        url: &str,
        info_endpoint: Option<&str>,
        health_endpoint: Option<&str>,
    ) -> Result<MonitoredService, RegistrationError> {
        validate_url(url)?;
        if self.store.exists_by_url(url) {
            return Err(RegistrationError::DuplicateUrl);
        }

        let mut service = MonitoredService::new(url);
        if let Some(endpoint) = info_endpoint.filter(|e| !e.trim().is_empty()) {
            service.info_endpoint = endpoint.to_string();
        }
        if let Some(endpoint) = health_endpoint.filter(|e| !e.trim().is_empty()) {
            service.health_endpoint = endpoint.to_string();
        }

        self.poller.refresh_info(&mut service).await;
        if !service.info_ok {
            tracing::warn!(url, "Could not fetch info for new service");
        }

        let service = self.store.save(service);
        self.notify_listeners(&service);
        self.publish(MonitoringEvent::ServiceAdded {
            service: service.clone(),
            timestamp: Utc::now(),
        });
        tracing::info!(
            service_id = service.id,
            url,
            "Registered service '{}'",
            service.display_name()
        );
        Ok(service)
    }

    pub fn services(&self) -> Vec<MonitoredService> {
        self.store.find_all()
    }

    pub fn find(&self, id: ServiceId) -> Option<MonitoredService> {
        self.store.find(id)
    }

    /// Poll every registered service, persist the updated records, and
    /// return the batch. A service removed while the cycle was in flight is
    /// neither written back nor returned; removal wins over the stale poll.
    pub async fn refresh_all(&self) -> Vec<MonitoredService> {
        let services = self.store.find_all();
        let mut batch = self.poller.poll_all(services).await;
        batch.retain(|service| {
            let kept = self.store.update(service.clone());
            if !kept {
                tracing::debug!(
                    service_id = service.id,
                    "Discarding poll result for service removed mid-cycle"
                );
            }
            kept
        });
        batch
    }

    /// Remove a service. The removal event is published before deletion so
    /// channels still see the full record.
    pub fn remove(&self, service: MonitoredService) {
        self.publish(MonitoringEvent::ServiceRemoved {
            service: service.clone(),
            timestamp: Utc::now(),
        });
        if let Some(id) = service.id {
            self.store.delete(id);
        }
        self.notify_listeners(&service);
        tracing::info!(
            service_id = service.id,
            "Removed service '{}'",
            service.display_name()
        );
    }

    pub fn update_service_url(&self, mut service: MonitoredService, new_url: String) -> MonitoredService {
        service.url = new_url;
        let service = self.store.save(service);
        self.notify_listeners(&service);
        service
    }

    /// Register a callback invoked whenever a service record changes; the
    /// UI collaborator hangs its refresh off this.
    pub fn add_listener(&self, listener: impl Fn(&MonitoredService) + Send + Sync + 'static) {
        self.listeners.write().push(Box::new(listener));
    }

    pub fn notify_listeners(&self, service: &MonitoredService) {
        for listener in self.listeners.read().iter() {
            listener(service);
        }
    }

    fn publish(&self, event: MonitoringEvent) {
        // The receiver may be gone during shutdown; events are best-effort.
        if self.events.send(event).is_err() {
            tracing::debug!("Event channel closed, dropping monitoring event");
        }
    }
}

fn validate_url(url: &str) -> Result<(), RegistrationError> {
    if url.trim().is_empty() {
        return Err(RegistrationError::BlankUrl);
    }
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| RegistrationError::InvalidUrl(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(RegistrationError::UnsupportedScheme(other.to_string())),
    }
}
