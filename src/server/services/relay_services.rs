use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use axum::response::Response;
use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::config::{RedirectMode, RelayConfig};
use crate::server::error::{AppResult, Error};
use crate::server::services::upstream_services::{
    DynUpstreamClient, UpstreamRequest, UpstreamResponse,
};
use crate::server::utils::header_utils::{Direction, HeaderUtil};
use crate::server::utils::metrics_utils::MetricsUtil;
use crate::server::utils::url_utils::UrlUtil;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// The inbound request after routing, path is everything after the route prefix.
#[derive(Debug, Clone)]
pub struct RelayRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Terminal response plus every url that was requested to get it, first one included.
pub struct ResolvedResponse {
    pub response: UpstreamResponse,
    pub chain: Vec<String>,
}

impl ResolvedResponse {
    pub fn follow_ups(&self) -> usize {
        self.chain.len().saturating_sub(1)
    }
}

pub type DynRelayService = Arc<dyn RelayServiceTrait + Send + Sync>;

#[async_trait::async_trait]
pub trait RelayServiceTrait {
    /// full pipeline, inbound request in, caller facing response out
    async fn relay(&self, request: RelayRequest) -> AppResult<Response>;

    /// chase redirects through the relay until something that isn't a redirect comes back
    async fn resolve(&self, request: UpstreamRequest) -> AppResult<ResolvedResponse>;
}

pub struct RelayService {
    config: Arc<RelayConfig>,
    upstream: DynUpstreamClient,
}

impl RelayService {
    pub fn new(config: Arc<RelayConfig>, upstream: DynUpstreamClient) -> Self {
        Self { config, upstream }
    }

    /// Location worth following, None for anything that ends the chain. A blank location would
    /// resolve to the url that produced it, so it ends the chain too.
    fn redirect_location(response: &UpstreamResponse) -> Option<&HeaderValue> {
        if !response.status.is_redirection() {
            return None;
        }

        response
            .headers
            .get(header::LOCATION)
            .filter(|v| !v.as_bytes().trim_ascii().is_empty())
    }

    /// Turns the final upstream response into what the caller gets. Status is copied as is,
    /// headers go through the inbound filter, a location at the bare origin is put back behind the
    /// relay and the body is streamed through untouched.
    pub fn build_response(&self, method: &Method, upstream: UpstreamResponse) -> Response {
        let UpstreamResponse {
            status,
            headers,
            body,
        } = upstream;

        let mut headers = HeaderUtil::sanitize(&headers, Direction::Inbound, &self.config);

        if let Some(rewritten) = headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|location| UrlUtil::relay_location(&self.config, location))
        {
            debug!("Rewriting location to {}", rewritten);
            match HeaderValue::from_str(&rewritten) {
                Ok(value) => {
                    headers.insert(header::LOCATION, value);
                }
                Err(e) => warn!("Rewritten location {} is not a header value: {}", rewritten, e),
            }
        }

        if !headers.contains_key(header::CONTENT_TYPE) {
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(FALLBACK_CONTENT_TYPE),
            );
        }

        let bodyless = *method == Method::HEAD
            || status.is_informational()
            || status == StatusCode::NO_CONTENT
            || status == StatusCode::NOT_MODIFIED;

        let body = if bodyless {
            if status == StatusCode::NO_CONTENT {
                headers.remove(header::CONTENT_LENGTH);
            }
            Body::empty()
        } else {
            body
        };

        MetricsUtil::record_response(status.as_u16());

        let mut response = Response::new(body);
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }
}

#[async_trait::async_trait]
impl RelayServiceTrait for RelayService {
    async fn relay(&self, request: RelayRequest) -> AppResult<Response> {
        let RelayRequest {
            method,
            path,
            query,
            headers,
            body,
        } = request;

        MetricsUtil::record_request(self.config.redirect_mode);

        let target = UrlUtil::build_upstream_url(&self.config, &path, query.as_deref());
        let outbound = HeaderUtil::sanitize(&headers, Direction::Outbound, &self.config);

        debug!("Relaying {} {} ({:?})", method, target, self.config.redirect_mode);

        let upstream_request = UpstreamRequest::new(method.clone(), target, outbound, body);

        let upstream_response = match self.config.redirect_mode {
            RedirectMode::Follow => self.resolve(upstream_request).await.map(|resolved| {
                if resolved.follow_ups() > 0 {
                    info!(
                        "Resolved {} after {} redirects",
                        resolved.chain.last().map(String::as_str).unwrap_or_default(),
                        resolved.follow_ups()
                    );
                }
                resolved.response
            }),
            RedirectMode::PassThrough => self.upstream.send(upstream_request).await,
        }
        .inspect_err(|e| MetricsUtil::record_failure(e.kind()))?;

        Ok(self.build_response(&method, upstream_response))
    }

    async fn resolve(&self, request: UpstreamRequest) -> AppResult<ResolvedResponse> {
        let mut chain = vec![request.url.clone()];
        let mut request = request;

        loop {
            let response = self.upstream.send(request.clone()).await?;

            let Some(location) = Self::redirect_location(&response) else {
                return Ok(ResolvedResponse { response, chain });
            };

            if chain.len() >= self.config.max_redirects as usize {
                warn!(
                    "Giving up on {} after {} requests, still redirecting",
                    chain[0],
                    chain.len()
                );
                return Err(Error::RedirectLimitExceeded {
                    limit: self.config.max_redirects,
                });
            }

            let location = location
                .to_str()
                .map_err(|e| Error::MalformedLocation(e.to_string()))?;
            let current = UrlUtil::upstream_view(&self.config, &request.url)?;
            let next = UrlUtil::rebuild_from_location(&self.config, &current, location)?;

            debug!(
                "Hop {}: {} -> {} ({})",
                chain.len(),
                request.url,
                next,
                response.status
            );
            MetricsUtil::record_redirect_hop();

            chain.push(next.clone());
            request = request.redirected(response.status, next);
        }
    }
}
