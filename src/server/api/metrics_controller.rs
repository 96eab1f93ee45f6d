use axum::{Router, routing::get};
use metrics_exporter_prometheus::PrometheusHandle;

pub struct MetricsController;

impl MetricsController {
    pub fn app(handle: PrometheusHandle) -> Router {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    }
}
