use axum::{
    Extension, Router,
    extract::{Path, RawQuery},
    http::{HeaderMap, Method},
    response::Response,
    routing::any,
};
use bytes::Bytes;
use tracing::debug;

use crate::server::{
    error::AppResult,
    services::{ProxyServices, relay_services::RelayRequest},
};

pub struct ProxyController;

impl ProxyController {
    /// mounted under the route prefix, everything after it is the upstream path
    pub fn app() -> Router {
        Router::new().route("/{*path}", any(Self::proxy))
    }

    async fn proxy(
        Extension(services): Extension<ProxyServices>,
        method: Method,
        Path(path): Path<String>,
        RawQuery(query): RawQuery,
        headers: HeaderMap,
        body: Bytes,
    ) -> AppResult<Response> {
        debug!(
            "Inbound {} /{} (query: {:?}, {} body bytes)",
            method,
            path,
            query,
            body.len()
        );

        services
            .relay
            .relay(RelayRequest {
                method,
                path,
                query,
                headers,
                body,
            })
            .await
    }
}
