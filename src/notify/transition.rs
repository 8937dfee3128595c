//! Health transition detection across polling cycles.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use parking_lot::Mutex;

use crate::model::{MonitoredService, ServiceId};
use crate::notify::event::MonitoringEvent;

/// Tracks the previous health verdict per service id and turns verdict
/// changes into [`MonitoringEvent::HealthChanged`] events.
///
/// The map is the only shared state; observation is read-modify-write under
/// one lock so a slow cycle's pruning cannot race a later cycle's update.
pub struct TransitionTracker {
    previous: Mutex<HashMap<ServiceId, bool>>,
}

impl TransitionTracker {
    pub fn new() -> Self {
        Self {
            previous: Mutex::new(HashMap::new()),
        }
    }

    /// Compare a complete poll batch against the recorded verdicts.
    ///
    /// First observation of an id records it without an event; an unchanged
    /// verdict is silent; a changed verdict emits exactly one event. Ids
    /// absent from the batch are pruned, so a service that disappears and
    /// later returns is observed fresh rather than compared to stale
    /// history. Unsaved services (no id) are skipped.
    pub fn observe(&self, batch: &[MonitoredService]) -> Vec<MonitoringEvent> {
        let mut previous = self.previous.lock();
        let mut events = Vec::new();
        let current_ids: HashSet<ServiceId> = batch.iter().filter_map(|s| s.id).collect();

        for service in batch {
            let Some(id) = service.id else {
                continue;
            };

            let currently_healthy = service.health_ok;
            match previous.insert(id, currently_healthy) {
                None => {
                    tracing::debug!(
                        service_id = id,
                        healthy = currently_healthy,
                        "First observation for service '{}'",
                        service.display_name()
                    );
                }
                Some(previously_healthy) if previously_healthy != currently_healthy => {
                    tracing::info!(
                        service_id = id,
                        "Health state changed for service '{}': {} -> {}",
                        service.display_name(),
                        previously_healthy,
                        currently_healthy
                    );
                    events.push(MonitoringEvent::HealthChanged {
                        service: service.clone(),
                        previously_healthy,
                        currently_healthy,
                        timestamp: Utc::now(),
                    });
                }
                Some(_) => {}
            }
        }

        previous.retain(|id, _| current_ids.contains(id));
        events
    }
}

impl Default for TransitionTracker {
    fn default() -> Self {
        Self::new()
    }
}
