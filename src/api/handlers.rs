use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::model::{MonitoredService, ServiceId};
use crate::monitor::{MonitoringService, RegistrationError};
use crate::notify::channel::{ConfigField, NotificationChannel};
use crate::notify::config::{ChannelConfig, ChannelOverride, NotificationConfigService};

/// Application state shared across handlers
pub struct AppState {
    pub monitor: Arc<MonitoringService>,
    pub config: Arc<NotificationConfigService>,
    /// Registered channels in dispatch order.
    pub channels: Vec<Arc<dyn NotificationChannel>>,
}

impl AppState {
    fn channel(&self, channel_type: &str) -> Result<&Arc<dyn NotificationChannel>, ApiError> {
        self.channels
            .iter()
            .find(|c| c.channel_type() == channel_type)
            .ok_or_else(|| ApiError::NotFound(format!("unknown channel type '{channel_type}'")))
    }

    fn require_service(&self, id: ServiceId) -> Result<MonitoredService, ApiError> {
        self.monitor
            .find(id)
            .ok_or_else(|| ApiError::NotFound(format!("no service with id {id}")))
    }
}

// ============================================================================
// Health Check
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============================================================================
// Service registration
// ============================================================================

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub url: String,
    #[serde(default)]
    pub info_endpoint: Option<String>,
    #[serde(default)]
    pub health_endpoint: Option<String>,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let service = state
        .monitor
        .register_with_endpoints(
            &request.url,
            request.info_endpoint.as_deref(),
            request.health_endpoint.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(service)))
}

pub async fn list_services(State(state): State<Arc<AppState>>) -> Json<Vec<MonitoredService>> {
    Json(state.monitor.services())
}

pub async fn remove_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ServiceId>,
) -> Result<StatusCode, ApiError> {
    let service = state.require_service(id)?;
    state.monitor.remove(service);
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Channel configuration
// ============================================================================

#[derive(Serialize)]
pub struct ChannelDescriptor {
    pub channel_type: &'static str,
    pub display_name: &'static str,
    pub config_fields: Vec<ConfigField>,
}

pub async fn list_channels(State(state): State<Arc<AppState>>) -> Json<Vec<ChannelDescriptor>> {
    let channels = state
        .channels
        .iter()
        .map(|c| ChannelDescriptor {
            channel_type: c.channel_type(),
            display_name: c.display_name(),
            config_fields: c.config_fields(),
        })
        .collect();
    Json(channels)
}

pub async fn get_channel_config(
    State(state): State<Arc<AppState>>,
    Path(channel_type): Path<String>,
) -> Result<Json<ChannelConfig>, ApiError> {
    state.channel(&channel_type)?;
    state
        .config
        .global_config(&channel_type)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no configuration for channel '{channel_type}'")))
}

#[derive(Deserialize)]
pub struct ChannelConfigRequest {
    pub enabled: bool,
    #[serde(default)]
    pub config_json: String,
}

pub async fn put_channel_config(
    State(state): State<Arc<AppState>>,
    Path(channel_type): Path<String>,
    Json(request): Json<ChannelConfigRequest>,
) -> Result<Json<ChannelConfig>, ApiError> {
    let channel = state.channel(&channel_type)?;
    if !request.config_json.trim().is_empty() && !channel.validate(&request.config_json) {
        return Err(ApiError::BadRequest(format!(
            "config rejected by channel '{channel_type}'"
        )));
    }

    let saved = state.config.save_global_config(ChannelConfig::new(
        channel_type,
        request.enabled,
        request.config_json,
    ));
    Ok(Json(saved))
}

// ============================================================================
// Per-service overrides
// ============================================================================

pub async fn list_service_overrides(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ServiceId>,
) -> Result<Json<Vec<ChannelOverride>>, ApiError> {
    state.require_service(id)?;
    Ok(Json(state.config.overrides_for_service(id)))
}

#[derive(Deserialize)]
pub struct OverrideRequest {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub config_json: Option<String>,
}

pub async fn put_service_override(
    State(state): State<Arc<AppState>>,
    Path((id, channel_type)): Path<(ServiceId, String)>,
    Json(request): Json<OverrideRequest>,
) -> Result<Json<ChannelOverride>, ApiError> {
    state.require_service(id)?;
    let channel = state.channel(&channel_type)?;

    if let Some(config_json) = request.config_json.as_deref() {
        if !config_json.trim().is_empty() && !channel.validate(config_json) {
            return Err(ApiError::BadRequest(format!(
                "config rejected by channel '{channel_type}'"
            )));
        }
    }

    let mut service_override = ChannelOverride::new(id, channel_type);
    service_override.enabled = request.enabled;
    service_override.config_json = request.config_json;
    Ok(Json(state.config.save_override(service_override)))
}

pub async fn delete_service_override(
    State(state): State<Arc<AppState>>,
    Path((id, channel_type)): Path<(ServiceId, String)>,
) -> Result<StatusCode, ApiError> {
    state.require_service(id)?;
    state.config.delete_override(id, &channel_type);
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
}

impl From<RegistrationError> for ApiError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::DuplicateUrl => ApiError::Conflict(err.to_string()),
            _ => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}
