//! Concurrent status polling of registered services.
//!
//! One task per service fetches the info and health endpoints and derives
//! the verdict. Fetch and decode failures degrade the corresponding status
//! flag; they never escape a poll cycle.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Deserialize;

use crate::model::MonitoredService;
use crate::settings::AppSettings;

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct InfoResponse {
    name: Option<String>,
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: Option<String>,
    components: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Polls registered services for liveness and metadata.
pub struct StatusPoller {
    client: reqwest::Client,
    settings: Arc<AppSettings>,
}

impl StatusPoller {
    pub fn new(client: reqwest::Client, settings: Arc<AppSettings>) -> Self {
        Self { client, settings }
    }

    /// Build a poller with its own client. The timeout bounds every fetch so
    /// one unreachable target cannot stall a cycle; a client that cannot
    /// carry the timeout is an error, not a poller without one.
    pub fn with_timeout(
        timeout: Duration,
        settings: Arc<AppSettings>,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::new(client, settings))
    }

    /// Poll every service concurrently and return the fully updated batch.
    /// Each task owns its service record; results arrive only once all
    /// fetches have finished.
    pub async fn poll_all(&self, services: Vec<MonitoredService>) -> Vec<MonitoredService> {
        join_all(services.into_iter().map(|mut service| async move {
            self.fetch_status(&mut service).await;
            service
        }))
        .await
    }

    /// Update one service's status fields in place.
    pub async fn fetch_status(&self, service: &mut MonitoredService) {
        self.refresh_info(service).await;
        self.refresh_health(service).await;
        service.last_updated = Utc::now();
    }

    /// Fetch the info endpoint: success updates name/version (absent fields
    /// keep their previous values), any failure only clears the flag.
    pub async fn refresh_info(&self, service: &mut MonitoredService) {
        let url = format!("{}{}", service.url, service.info_endpoint);
        match self.get_json::<InfoResponse>(&url).await {
            Ok(info) => {
                service.info_ok = true;
                if let Some(name) = info.name {
                    service.name = Some(name);
                }
                if let Some(version) = info.version {
                    service.version = Some(version);
                }
            }
            Err(e) => {
                tracing::debug!(url = url.as_str(), error = %e, "Info fetch failed");
                service.info_ok = false;
            }
        }
    }

    async fn refresh_health(&self, service: &mut MonitoredService) {
        let url = format!("{}{}", service.url, service.health_endpoint);
        match self.get_json::<HealthResponse>(&url).await {
            Ok(health) => {
                service.health_ok = health
                    .status
                    .as_deref()
                    .map(|s| s.eq_ignore_ascii_case("UP"))
                    .unwrap_or(false);
                service.health_raw = health.status;
                if let Some(components) = &health.components {
                    self.extract_certificate_expiry(service, components);
                }
            }
            Err(e) => {
                tracing::debug!(url = url.as_str(), error = %e, "Health fetch failed");
                service.health_ok = false;
                service.health_raw = Some("DOWN".to_string());
            }
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, reqwest::Error> {
        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<T>()
            .await
    }

    fn extract_certificate_expiry(
        &self,
        service: &mut MonitoredService,
        components: &serde_json::Map<String, serde_json::Value>,
    ) {
        if let Some(earliest) = earliest_cert_expiry(components) {
            service.earliest_cert_expiry = Some(earliest);
            let warning_days = self.settings.cert_expiry_warning_days();
            service.cert_expiring_soon = earliest < Utc::now() + chrono::Duration::days(warning_days);
        }
    }
}

/// Values of an object or elements of an array; anything else has none.
fn children(node: &serde_json::Value) -> Box<dyn Iterator<Item = &serde_json::Value> + '_> {
    match node {
        serde_json::Value::Array(items) => Box::new(items.iter()),
        serde_json::Value::Object(map) => Box::new(map.values()),
        _ => Box::new(std::iter::empty()),
    }
}

/// Earliest certificate expiry in the health payload's ssl component tree
/// (`ssl.details.*.certificateChain.*.*.validityEnds`). Unparsable dates are
/// skipped, not fatal.
fn earliest_cert_expiry(
    components: &serde_json::Map<String, serde_json::Value>,
) -> Option<DateTime<Utc>> {
    let details = components.get("ssl")?.get("details")?;
    let mut earliest: Option<DateTime<Utc>> = None;

    for bundle in children(details) {
        let Some(chain) = bundle.get("certificateChain") else {
            continue;
        };
        for alias_entry in children(chain) {
            for cert in children(alias_entry) {
                let Some(ends) = cert.get("validityEnds").and_then(|v| v.as_str()) else {
                    continue;
                };
                if let Ok(expiry) = ends.parse::<DateTime<Utc>>() {
                    if earliest.map_or(true, |e| expiry < e) {
                        earliest = Some(expiry);
                    }
                }
            }
        }
    }
    earliest
}
