//! Monitoring events consumed by the notification dispatcher.

use chrono::{DateTime, Utc};

use crate::model::MonitoredService;

/// A state change worth telling someone about. Each variant carries a
/// snapshot of the service at the moment of detection.
#[derive(Debug, Clone)]
pub enum MonitoringEvent {
    ServiceAdded {
        service: MonitoredService,
        timestamp: DateTime<Utc>,
    },
    ServiceRemoved {
        service: MonitoredService,
        timestamp: DateTime<Utc>,
    },
    HealthChanged {
        service: MonitoredService,
        previously_healthy: bool,
        currently_healthy: bool,
        timestamp: DateTime<Utc>,
    },
}

impl MonitoringEvent {
    pub fn service(&self) -> &MonitoredService {
        match self {
            MonitoringEvent::ServiceAdded { service, .. }
            | MonitoringEvent::ServiceRemoved { service, .. }
            | MonitoringEvent::HealthChanged { service, .. } => service,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            MonitoringEvent::ServiceAdded { timestamp, .. }
            | MonitoringEvent::ServiceRemoved { timestamp, .. }
            | MonitoringEvent::HealthChanged { timestamp, .. } => *timestamp,
        }
    }

    /// True for a healthy-to-unhealthy transition.
    pub fn went_down(&self) -> bool {
        matches!(
            self,
            MonitoringEvent::HealthChanged {
                previously_healthy: true,
                currently_healthy: false,
                ..
            }
        )
    }

    /// True for an unhealthy-to-healthy transition.
    pub fn came_up(&self) -> bool {
        matches!(
            self,
            MonitoringEvent::HealthChanged {
                previously_healthy: false,
                currently_healthy: true,
                ..
            }
        )
    }
}
