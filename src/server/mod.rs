pub mod api;
pub mod dtos;
pub mod error;
pub mod services;
pub mod utils;

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use anyhow::Context;
use axum::{
    Extension, Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::get,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::config::AppConfig;
use api::{
    health_controller::health_endpoint, metrics_controller::MetricsController,
    proxy_controller::ProxyController,
};
use services::ProxyServices;

/// everything under here is relayed, the rest of the path is the upstream path
pub const RELAY_ROUTE_PREFIX: &str = "/api/starhub";

static START_TIME: OnceLock<Instant> = OnceLock::new();

pub fn get_uptime_seconds() -> u64 {
    START_TIME.get_or_init(Instant::now).elapsed().as_secs()
}

pub fn get_app_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub struct ApplicationServer;

impl ApplicationServer {
    pub async fn serve(config: Arc<AppConfig>, metrics: PrometheusHandle) -> anyhow::Result<()> {
        START_TIME.get_or_init(Instant::now);

        let services = ProxyServices::new(config.clone()).context("failed to start services")?;
        let app = Self::router(services, Some(metrics));

        let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {}", addr))?;

        info!("routes ok, listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(Self::shutdown_signal())
            .await
            .context("error while serving")?;

        info!("server shut down");

        Ok(())
    }

    /// split out from serve so tests can mount the exact same routes on a random port
    pub fn router(services: ProxyServices, metrics: Option<PrometheusHandle>) -> Router {
        let cors = Self::cors_layer(&services.config.cors_origin);
        let max_body_bytes = services.config.max_body_bytes;

        let mut router = Router::new()
            .nest(RELAY_ROUTE_PREFIX, ProxyController::app())
            .route("/health", get(health_endpoint));

        if let Some(handle) = metrics {
            router = router.merge(MetricsController::app(handle));
        }

        router.layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(max_body_bytes))
                .layer(Extension(services)),
        )
    }

    // * or a comma seperated list of origins, preflights are answered here and never relayed
    fn cors_layer(cors_origin: &str) -> CorsLayer {
        let allow_origin = if cors_origin.trim() == "*" {
            AllowOrigin::any()
        } else {
            AllowOrigin::list(
                cors_origin
                    .split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .filter_map(|origin| HeaderValue::from_str(origin).ok()),
            )
        };

        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers(Any)
            .max_age(Duration::from_secs(86400))
    }

    async fn shutdown_signal() {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for shutdown signal: {}", e);
        }
    }
}
