//! Health Check Handler
//!
//! `GET /health` reports the service identity and whether the user store
//! answers. It is not behind the token guard.

use actix_web::{http::StatusCode, web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::user::AppState;
use crate::utils::response_handler::JsonData;
use crate::{SERVICE_NAME, VERSION};

/// Service status enumeration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: ServiceStatus,
    pub service: String,
    pub version: String,
}

impl HealthStatus {
    fn new(status: ServiceStatus) -> Self {
        Self {
            status,
            service: SERVICE_NAME.to_string(),
            version: VERSION.to_string(),
        }
    }
}

pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    match state.users.ping().await {
        Ok(()) => JsonData::success(HealthStatus::new(ServiceStatus::Healthy), "ok").into_response(),
        Err(err) => {
            log::error!("Health check failed: {}", err);
            JsonData {
                success: false,
                message: "store unavailable".to_string(),
                data: Some(HealthStatus::new(ServiceStatus::Unhealthy)),
            }
            .into_response_with(StatusCode::SERVICE_UNAVAILABLE)
        },
    }
}

pub fn configure_health_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health));
}
