//! Shared utilities for integration tests.

#![allow(dead_code)]

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::routing::{any, get};
use axum::{Json, Router};
use futures_util::stream::{self, StreamExt};
use serde_json::{json, Map, Value};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use recording_proxy::config::ProxyConfig;
use recording_proxy::http::HttpServer;
use recording_proxy::lifecycle::Shutdown;
use recording_proxy::recorder::{RecordStore, TransactionRecord};

/// Size of the `/big` upstream body.
pub const BIG_BODY_LEN: usize = 100_000;

pub fn big_body() -> Vec<u8> {
    (0..BIG_BODY_LEN).map(|i| (i % 256) as u8).collect()
}

/// What `/slow` sends before stalling.
pub const SLOW_FIRST_CHUNK: &[u8] = b"aaaaaaaaaa";

/// Raw HTTP response carrying `{"z":1}` gzip-compressed.
pub const GZIP_RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\n\
    Content-Type: application/json\r\n\
    Content-Encoding: gzip\r\n\
    Content-Length: 27\r\n\r\n\
    \x1f\x8b\x08\x00\x00\x00\x00\x00\x02\x03\xab\x56\xaa\x52\
    \xb2\x32\xac\x05\x00\x3c\x0a\x2b\x41\x07\x00\x00\x00";

/// First chunk right away, the rest after a long pause.
fn slow_body() -> Body {
    let first = stream::once(async { Ok::<_, Infallible>(Bytes::from_static(SLOW_FIRST_CHUNK)) });
    let rest = stream::once(async {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok::<_, Infallible>(Bytes::from_static(b"late"))
    });
    Body::from_stream(first.chain(rest))
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Value> {
    let mut seen = Map::new();
    for (name, value) in headers.iter() {
        seen.insert(
            name.as_str().to_string(),
            Value::String(String::from_utf8_lossy(value.as_bytes()).into_owned()),
        );
    }
    Json(json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "headers": seen,
        "body": String::from_utf8_lossy(&body),
    }))
}

/// Mock upstream API with a handful of fixed behaviors.
pub fn upstream_router() -> Router {
    Router::new()
        .route(
            "/models",
            get(|| async { ([(header::CONTENT_TYPE, "application/json")], r#"{"a":1}"#) }),
        )
        .route("/echo", any(echo))
        .route("/raw", any(|body: Bytes| async move { body }))
        .route(
            "/redirect",
            get(|| async { (StatusCode::FOUND, [(header::LOCATION, "/models")]) }),
        )
        .route("/big", get(|| async { big_body() }))
        .route("/slow", get(|| async { slow_body() }))
        .route(
            "/decorated",
            get(|| async {
                let mut headers = HeaderMap::new();
                headers.insert("x-upstream", "yes".parse().unwrap());
                headers.append(header::SET_COOKIE, "a=1".parse().unwrap());
                headers.append(header::SET_COOKIE, "b=2".parse().unwrap());
                (StatusCode::CREATED, headers, "decorated").into_response()
            }),
        )
}

/// Serve `router` on an ephemeral port.
pub async fn start_upstream(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// Upstream that reads the request head, writes `response` verbatim and closes.
pub async fn start_raw_upstream(response: &'static [u8]) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = [0u8; 4096];
                        let _ = socket.read(&mut buf).await;
                        let _ = socket.write_all(response).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });
    addr
}

/// Upstream that accepts connections and never answers.
pub async fn start_silent_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}

/// An address nothing listens on.
pub fn dead_address() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

pub fn proxy_config(upstream_base: String, log_dir: &Path) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upstream.base_url = upstream_base;
    config.upstream.use_system_proxy = false;
    config.upstream.connect_timeout_secs = 2;
    config.upstream.read_timeout_secs = 5;
    config.recording.log_dir = log_dir.to_path_buf();
    config
}

/// Start the proxy on an ephemeral port.
pub async fn start_proxy(config: ProxyConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    (addr, shutdown)
}

/// Start the proxy in front of `upstream` with default test settings.
pub async fn start_proxy_to(upstream: SocketAddr, log_dir: &Path) -> (SocketAddr, Shutdown) {
    start_proxy(proxy_config(format!("http://{}", upstream), log_dir)).await
}

/// Client that talks to the proxy directly and never follows redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// Wait until at least `count` records exist, then return them newest first.
pub async fn wait_for_records(log_dir: &Path, count: usize) -> Vec<(PathBuf, TransactionRecord)> {
    let store = RecordStore::new(log_dir);
    for _ in 0..100 {
        let keys = store.list_keys().await.unwrap();
        if keys.len() >= count {
            let mut records = Vec::new();
            for key in keys {
                let record = store.read(&key).await.unwrap();
                records.push((key, record));
            }
            return records;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("expected {count} records in {}", log_dir.display());
}
