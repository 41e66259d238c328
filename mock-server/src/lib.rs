use std::{
    collections::HashMap,
    io,
    net::{Ipv4Addr, SocketAddr},
    sync::Arc,
};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode, Uri},
    routing::get,
    Router,
};
use tokio::{net::TcpListener, sync::RwLock};

/// Credentials accepted by `/protected` (`user:password`).
pub const BASIC_AUTH: &str = "Basic dXNlcjpwYXNzd29yZA==";

/// Port used by the standalone binary when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 3000;

/// Requests seen so far per `/flaky/{key}/{failures}` key.
pub type Hits = Arc<RwLock<HashMap<String, u32>>>;

pub fn app() -> Router {
    let hits: Hits = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/", get(index))
        .route("/hello", get(hello))
        .route("/created", get(created))
        .route("/missing", get(missing))
        .route("/protected", get(protected))
        .route("/echo/user-agent", get(echo_user_agent))
        .route("/echo/uri", get(echo_uri))
        .route("/flaky/{key}/{failures}", get(flaky))
        .with_state(hits)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Loopback address for the standalone binary. `port` is the raw `PORT`
/// value; `0` asks the OS for a free port.
pub fn listen_addr(port: Option<&str>) -> io::Result<SocketAddr> {
    let port = match port {
        None => DEFAULT_PORT,
        Some(raw) => raw.trim().parse::<u16>().map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidInput, format!("PORT {raw:?}: {e}"))
        })?,
    };
    Ok(SocketAddr::from((Ipv4Addr::LOCALHOST, port)))
}

async fn index() -> &'static str {
    "<html><body>index</body></html>"
}

async fn hello() -> &'static str {
    "hello"
}

async fn created() -> (StatusCode, &'static str) {
    (StatusCode::CREATED, "created")
}

async fn missing() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}

async fn protected(headers: HeaderMap) -> (StatusCode, &'static str) {
    match headers.get(header::AUTHORIZATION) {
        Some(value) if value == BASIC_AUTH => (StatusCode::OK, "secret"),
        _ => (StatusCode::UNAUTHORIZED, "unauthorized"),
    }
}

async fn echo_user_agent(headers: HeaderMap) -> String {
    headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string()
}

async fn echo_uri(uri: Uri) -> String {
    uri.to_string()
}

/// Answers 503 for the first `failures` requests under `key`, then 200.
async fn flaky(
    State(hits): State<Hits>,
    Path((key, failures)): Path<(String, u32)>,
) -> (StatusCode, String) {
    let mut hits = hits.write().await;
    let seen = hits.entry(key).or_insert(0);
    *seen += 1;
    if *seen <= failures {
        (StatusCode::SERVICE_UNAVAILABLE, format!("attempt {seen} failed"))
    } else {
        (StatusCode::OK, format!("ok after {seen}"))
    }
}
