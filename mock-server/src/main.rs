//! Serve the stub documents on loopback for trying `fetch-url` by hand.

use tokio::net::TcpListener;

#[tokio::main(flavor = "current_thread")]
async fn main() -> std::io::Result<()> {
    let port = std::env::var("PORT").ok();
    let listener = TcpListener::bind(mock_server::listen_addr(port.as_deref())?).await?;
    let base = format!("http://{}", listener.local_addr()?);
    eprintln!("mock server ready: {base}/hello, {base}/flaky/<key>/<failures>");
    mock_server::run(listener).await
}
