//! Application settings backed by a key/value store.

use std::sync::Arc;

/// Setting key for the certificate expiry warning threshold.
pub const CERT_EXPIRY_WARNING_DAYS: &str = "cert.expiry.warning.days";
pub const DEFAULT_CERT_EXPIRY_WARNING_DAYS: i64 = 30;

/// Key/value store of string settings.
pub trait SettingStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str);
}

/// Typed access to application settings.
pub struct AppSettings {
    store: Arc<dyn SettingStore>,
}

impl AppSettings {
    pub fn new(store: Arc<dyn SettingStore>) -> Self {
        Self { store }
    }

    pub fn value(&self, key: &str, default: &str) -> String {
        self.store.get(key).unwrap_or_else(|| default.to_string())
    }

    pub fn set_value(&self, key: &str, value: &str) {
        self.store.set(key, value);
    }

    /// Days before a certificate expiry at which a service is flagged as
    /// expiring soon. Absent or unparsable values fall back to the default.
    pub fn cert_expiry_warning_days(&self) -> i64 {
        self.store
            .get(CERT_EXPIRY_WARNING_DAYS)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_CERT_EXPIRY_WARNING_DAYS)
    }
}
