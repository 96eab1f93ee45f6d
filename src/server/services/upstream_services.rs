use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::body::Body;
use axum::http::{HeaderMap, Method, StatusCode, header};
use bytes::Bytes;
use futures::TryStreamExt;
use tracing::{debug, error};

use crate::server::error::AppResult;

/// One request to the relay. Cloned for every hop so the body is kept as `Bytes`.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl UpstreamRequest {
    pub fn new(method: Method, url: String, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            url,
            headers,
            body,
        }
    }

    /// the same request pointed at the next hop
    ///
    /// 303 (and 301/302 after a POST) turn into a bodyless GET like a browser would, 307/308 keep
    /// everything
    pub fn redirected(mut self, status: StatusCode, url: String) -> Self {
        let switch_to_get = match status {
            StatusCode::SEE_OTHER => self.method != Method::HEAD,
            StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND => self.method == Method::POST,
            _ => false,
        };

        if switch_to_get {
            self.method = Method::GET;
            self.body = Bytes::new();
            self.headers.remove(header::CONTENT_TYPE);
        }

        self.url = url;
        self
    }
}

/// What came back from the relay, body not read yet.
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Body,
}

pub type DynUpstreamClient = Arc<dyn UpstreamClientTrait + Send + Sync>;

#[async_trait::async_trait]
pub trait UpstreamClientTrait {
    /// Sends exactly one request. Redirects are returned as is, never followed.
    async fn send(&self, request: UpstreamRequest) -> AppResult<UpstreamResponse>;
}

pub struct ReqwestUpstreamClient {
    http: reqwest::Client,
}

impl ReqwestUpstreamClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        // following redirects here would send the next hop straight to the cdn and skip the relay
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(timeout)
            .build()
            .context("Failed to build upstream http client")?;

        Ok(Self { http })
    }
}

#[async_trait::async_trait]
impl UpstreamClientTrait for ReqwestUpstreamClient {
    async fn send(&self, request: UpstreamRequest) -> AppResult<UpstreamResponse> {
        let UpstreamRequest {
            method,
            url,
            mut headers,
            body,
        } = request;

        // reqwest frames the body itself
        headers.remove(header::CONTENT_LENGTH);

        let mut request_builder = self.http.request(method.clone(), &url).headers(headers);
        if method != Method::GET && method != Method::HEAD && !body.is_empty() {
            request_builder = request_builder.body(body);
        }

        debug!("Sending {} {}", method, url);

        let response = request_builder.send().await.map_err(|e| {
            error!("Upstream request to {} failed: {}", url, e);
            e
        })?;

        let status = response.status();
        let headers = response.headers().clone();

        debug!("Upstream answered {} for {}", status, url);

        // once this is streaming the status is already out, so a failure here can only be logged
        // and the connection cut
        let stream = response
            .bytes_stream()
            .inspect_err(move |e| error!("Upstream body from {} broke mid stream: {}", url, e));

        Ok(UpstreamResponse {
            status,
            headers,
            body: Body::from_stream(stream),
        })
    }
}
