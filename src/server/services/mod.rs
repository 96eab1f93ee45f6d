pub mod proxy_services;
pub mod relay_services;
pub mod upstream_services;

pub use proxy_services::ProxyServices;
pub use relay_services::DynRelayService;
pub use upstream_services::DynUpstreamClient;
