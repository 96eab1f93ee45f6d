use axum::Extension;
use axum::Json;
use axum::http::StatusCode;
use chrono::Utc;

use crate::config::RedirectMode;
use crate::logger::Logger;
use crate::server::dtos::health_dto::{HealthResponse, HealthStatus};
use crate::server::services::ProxyServices;
use crate::server::{get_app_version, get_uptime_seconds};

/// liveness only, the relay is not pinged so a health check never costs an upstream request
pub async fn health_endpoint(
    Extension(services): Extension<ProxyServices>,
) -> (StatusCode, Json<HealthResponse>) {
    let redirect_mode = match services.relay_config.redirect_mode {
        RedirectMode::Follow => "follow",
        RedirectMode::PassThrough => "pass-through",
    };

    let response = HealthResponse {
        status: HealthStatus::Healthy,
        timestamp: Utc::now(),
        uptime_seconds: get_uptime_seconds(),
        version: get_app_version().to_string(),
        environment: Logger::environment_name(services.config.cargo_env).to_string(),
        redirect_mode: redirect_mode.to_string(),
        upstream_origin: services.relay_config.upstream_origin.clone(),
    };

    (StatusCode::OK, Json(response))
}
