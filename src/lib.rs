//! BootGuard: Service Health Monitoring and Notification
//!
//! A Rust implementation of a health monitor for HTTP services exposing
//! actuator-style info and health endpoints, with transition detection and
//! a pluggable notification pipeline.
//!
//! # Features
//!
//! - **Status Polling**: Concurrent info/health fetches with per-request timeouts
//! - **Transition Detection**: DOWN/UP events only on actual state changes
//! - **Certificate Expiry**: Earliest TLS certificate expiry from health details
//! - **Notification Channels**: Email and Slack, extensible behind one trait
//! - **Per-Service Overrides**: Global channel config with per-service opt-outs
//! - **Background Scheduler**: Fixed-interval polling with graceful shutdown
//! - **HTTP API**: Register, list, and remove services; manage channel config
//!
//! # Example
//!
//! ```no_run
//! use bootguard::monitor::MonitoringService;
//! use bootguard::poller::StatusPoller;
//! use bootguard::settings::AppSettings;
//! use bootguard::store::{InMemoryServiceStore, InMemorySettingStore};
//! use std::sync::Arc;
//!
//! # async fn demo() {
//! let settings = Arc::new(AppSettings::new(Arc::new(InMemorySettingStore::new())));
//! let poller = StatusPoller::new(reqwest::Client::new(), settings);
//! let (events_tx, _events_rx) = tokio::sync::mpsc::unbounded_channel();
//! let monitor = MonitoringService::new(Arc::new(InMemoryServiceStore::new()), poller, events_tx);
//!
//! let service = monitor.register("http://localhost:8080").await.unwrap();
//! println!("Watching {}", service.display_name());
//! # }
//! ```

pub mod api;
pub mod model;
pub mod monitor;
pub mod notify;
pub mod poller;
pub mod scheduler;
pub mod settings;
pub mod store;

// Re-export commonly used types
pub use model::{MonitoredService, ServiceId};
pub use monitor::{MonitoringService, RegistrationError};
pub use notify::event::MonitoringEvent;
pub use poller::StatusPoller;
