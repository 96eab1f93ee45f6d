use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde_json::json;
use starhub_proxy::server::services::ProxyServices;
use starhub_proxy::server::services::upstream_services::ReqwestUpstreamClient;
use starhub_proxy::{AppConfig, ApplicationServer, RedirectMode, RelayConfig};
use tokio::net::TcpListener;

pub const ORIGIN: &str = "https://ucdn.starhubgo.com";

#[derive(Clone, Default)]
pub struct MockRelay {
    pub loop_hits: Arc<AtomicUsize>,
}

impl MockRelay {
    pub fn loop_hits(&self) -> usize {
        self.loop_hits.load(Ordering::SeqCst)
    }
}

/// Acts like cors-buster with the cdn behind it: the upstream url arrives as the request path.
pub async fn spawn_mock_relay() -> (String, MockRelay) {
    let relay = MockRelay::default();
    let app = Router::new()
        .fallback(mock_relay_handler)
        .with_state(relay.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://127.0.0.1:{port}/"), relay)
}

async fn mock_relay_handler(
    State(relay): State<MockRelay>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(path) = uri.path().strip_prefix(&format!("/{ORIGIN}")) else {
        return (StatusCode::BAD_GATEWAY, "not relayed to origin").into_response();
    };
    let query = uri.query().unwrap_or_default();

    match path {
        "/live/index.m3u8" => (
            [(header::CONTENT_TYPE, "application/vnd.apple.mpegurl")],
            "#EXTM3U\n#EXT-X-VERSION:3\nsegment0.ts\n",
        )
            .into_response(),
        "/raw.bin" => Response::builder()
            .status(StatusCode::OK)
            .body(Body::from(binary_payload()))
            .unwrap(),
        "/hop1" => redirect(StatusCode::FOUND, &format!("{ORIGIN}/hop2?sig=abc")),
        "/hop2" if query == "sig=abc" => redirect(StatusCode::MOVED_PERMANENTLY, "/final.m3u8"),
        "/hop2" => (StatusCode::FORBIDDEN, "signature dropped").into_response(),
        "/final.m3u8" => (
            [(header::CONTENT_TYPE, "application/vnd.apple.mpegurl")],
            "#EXTM3U\nfinal\n",
        )
            .into_response(),
        "/loop" => {
            relay.loop_hits.fetch_add(1, Ordering::SeqCst);
            redirect(StatusCode::FOUND, &format!("{ORIGIN}/loop"))
        }
        "/empty" => StatusCode::NO_CONTENT.into_response(),
        "/echo" => Json(json!({
            "method": method.as_str(),
            "body": String::from_utf8_lossy(&body),
            "user_agent": headers.get(header::USER_AGENT).and_then(|v| v.to_str().ok()),
            "forwarded_for": headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()),
            "proxy_authorization": headers.contains_key(header::PROXY_AUTHORIZATION),
            "custom": headers.get("x-custom").and_then(|v| v.to_str().ok()),
            "query": query,
        }))
        .into_response(),
        _ => (StatusCode::NOT_FOUND, "no such asset").into_response(),
    }
}

fn redirect(status: StatusCode, location: &str) -> Response {
    Response::builder()
        .status(status)
        .header(header::LOCATION, location)
        .body(Body::empty())
        .unwrap()
}

pub fn binary_payload() -> Vec<u8> {
    (0..=255u8).cycle().take(188 * 1000).collect()
}

/// the real router wired to the given relay, served on a random port
pub async fn spawn_proxy(relay_base: &str, mode: RedirectMode) -> String {
    let config = Arc::new(AppConfig::default());
    let relay_config =
        Arc::new(RelayConfig::new(relay_base, ORIGIN).with_redirect_mode(mode));
    let upstream = Arc::new(ReqwestUpstreamClient::new(Duration::from_secs(5)).unwrap());

    let services = ProxyServices::with_upstream(config, relay_config, upstream);
    let app = ApplicationServer::router(services, None);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://127.0.0.1:{port}")
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}
