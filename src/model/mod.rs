//! Domain model for monitored services.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable identifier assigned by the service store on first save.
pub type ServiceId = i64;

pub const DEFAULT_INFO_ENDPOINT: &str = "/actuator/info";
pub const DEFAULT_HEALTH_ENDPOINT: &str = "/actuator/health";

/// A registered HTTP service endpoint under monitoring.
///
/// Status fields (`info_ok`, `health_ok`, `health_raw`, certificate data,
/// `last_updated`) are written only by the poller task owning this record
/// during a cycle; identity fields change only through explicit edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoredService {
    /// `None` until the service has been persisted.
    pub id: Option<ServiceId>,
    /// Base URL, unique across all registered services.
    pub url: String,
    pub name: Option<String>,
    pub version: Option<String>,
    /// Whether the last info fetch succeeded.
    pub info_ok: bool,
    /// Whether the last health fetch reported status "UP".
    pub health_ok: bool,
    /// Raw status string from the last health poll ("UP", "DOWN", ...).
    pub health_raw: Option<String>,
    pub last_updated: DateTime<Utc>,
    pub info_endpoint: String,
    pub health_endpoint: String,
    /// Earliest certificate expiry found in the health payload's ssl component.
    pub earliest_cert_expiry: Option<DateTime<Utc>>,
    pub cert_expiring_soon: bool,
}

impl MonitoredService {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: None,
            url: url.into(),
            name: None,
            version: None,
            info_ok: false,
            health_ok: false,
            health_raw: None,
            last_updated: Utc::now(),
            info_endpoint: DEFAULT_INFO_ENDPOINT.to_string(),
            health_endpoint: DEFAULT_HEALTH_ENDPOINT.to_string(),
            earliest_cert_expiry: None,
            cert_expiring_soon: false,
        }
    }

    /// Human-facing name: display name when known, base URL otherwise.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.url)
    }
}
