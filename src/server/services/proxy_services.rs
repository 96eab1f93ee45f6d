use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::{AppConfig, RelayConfig};

use super::{
    relay_services::{DynRelayService, RelayService},
    upstream_services::{DynUpstreamClient, ReqwestUpstreamClient},
};

/// everything the handlers need, cloned into each request through an Extension
#[derive(Clone)]
pub struct ProxyServices {
    pub relay: DynRelayService,
    pub relay_config: Arc<RelayConfig>,
    pub config: Arc<AppConfig>,
}

impl ProxyServices {
    pub fn new(config: Arc<AppConfig>) -> anyhow::Result<Self> {
        info!("starting proxy services...");

        let relay_config = Arc::new(RelayConfig::from_app_config(&config));
        let upstream = Arc::new(ReqwestUpstreamClient::new(Duration::from_secs(
            config.upstream_timeout_secs,
        ))?) as DynUpstreamClient;

        info!(
            "relaying {} through {} ({:?}, max {} redirects)",
            relay_config.upstream_origin,
            relay_config.relay_base,
            relay_config.redirect_mode,
            relay_config.max_redirects
        );

        Ok(Self::with_upstream(config, relay_config, upstream))
    }

    /// same wiring with the upstream client swapped out, tests point this at a local relay
    pub fn with_upstream(
        config: Arc<AppConfig>,
        relay_config: Arc<RelayConfig>,
        upstream: DynUpstreamClient,
    ) -> Self {
        let relay =
            Arc::new(RelayService::new(relay_config.clone(), upstream)) as DynRelayService;

        Self {
            relay,
            relay_config,
            config,
        }
    }
}
