use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, listen_addr, BASIC_AUTH, DEFAULT_PORT};
use tower::ServiceExt;

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

async fn get(app: Router, uri: &str) -> axum::response::Response {
    app.oneshot(Request::builder().uri(uri).body(String::new()).unwrap())
        .await
        .unwrap()
}

// --- static documents ---

#[tokio::test]
async fn hello_returns_plain_body() {
    let resp = get(app(), "/hello").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(&body_bytes(resp).await[..], b"hello");
}

#[tokio::test]
async fn index_is_html() {
    let resp = get(app(), "/").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_bytes(resp).await;
    assert!(body.starts_with(b"<html>"));
}

#[tokio::test]
async fn created_returns_201() {
    let resp = get(app(), "/created").await;
    assert_eq!(resp.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn missing_returns_404() {
    let resp = get(app(), "/missing").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(&body_bytes(resp).await[..], b"Not Found");
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let resp = get(app(), "/nope").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- auth ---

#[tokio::test]
async fn protected_requires_credentials() {
    let resp = get(app(), "/protected").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_accepts_basic_auth() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/protected")
                .header(http::header::AUTHORIZATION, BASIC_AUTH)
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(&body_bytes(resp).await[..], b"secret");
}

#[tokio::test]
async fn protected_rejects_wrong_credentials() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/protected")
                .header(http::header::AUTHORIZATION, "Basic Og==")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- echo ---

#[tokio::test]
async fn echoes_user_agent() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/echo/user-agent")
                .header(http::header::USER_AGENT, "probe/1.0")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(&body_bytes(resp).await[..], b"probe/1.0");
}

#[tokio::test]
async fn echoes_path_and_query() {
    let resp = get(app(), "/echo/uri?lang=en&x=1").await;
    assert_eq!(&body_bytes(resp).await[..], b"/echo/uri?lang=en&x=1");
}

// --- flaky ---

#[tokio::test]
async fn flaky_fails_then_recovers() {
    let app = app();
    for _ in 0..2 {
        let resp = get(app.clone(), "/flaky/a/2").await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
    let resp = get(app.clone(), "/flaky/a/2").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(&body_bytes(resp).await[..], b"ok after 3");
}

#[tokio::test]
async fn flaky_keys_are_independent() {
    let app = app();
    let resp = get(app.clone(), "/flaky/a/1").await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let resp = get(app.clone(), "/flaky/b/0").await;
    assert_eq!(resp.status(), StatusCode::OK);
}

// --- standalone binary address ---

#[test]
fn listen_addr_defaults_to_loopback() {
    let addr = listen_addr(None).unwrap();
    assert!(addr.ip().is_loopback());
    assert_eq!(addr.port(), DEFAULT_PORT);
    assert_eq!(listen_addr(Some(" 8080 ")).unwrap().port(), 8080);
}

#[test]
fn listen_addr_rejects_bad_ports() {
    for raw in ["", "http", "70000", "-1"] {
        let err = listen_addr(Some(raw)).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput, "{raw:?}");
    }
}
