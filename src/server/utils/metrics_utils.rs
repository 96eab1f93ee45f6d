use anyhow::Context;
use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::config::RedirectMode;

pub struct MetricsUtil;

impl MetricsUtil {
    /// installs the global recorder, only call this once from main. Without it the counters below
    /// are no-ops which is what the tests rely on
    pub fn install() -> anyhow::Result<PrometheusHandle> {
        PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install prometheus recorder")
    }

    pub fn record_request(mode: RedirectMode) {
        let mode = match mode {
            RedirectMode::Follow => "follow",
            RedirectMode::PassThrough => "pass_through",
        };
        counter!("relay_requests_total", "mode" => mode).increment(1);
    }

    pub fn record_redirect_hop() {
        counter!("relay_redirect_hops_total").increment(1);
    }

    pub fn record_failure(kind: &'static str) {
        counter!("relay_failures_total", "kind" => kind).increment(1);
    }

    pub fn record_response(status: u16) {
        let status_class = match status {
            100..=199 => "1xx",
            200..=299 => "2xx",
            300..=399 => "3xx",
            400..=499 => "4xx",
            500..=599 => "5xx",
            _ => "unknown",
        };
        counter!("relay_responses_total", "status_class" => status_class).increment(1);
    }
}
