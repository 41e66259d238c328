//! Blocking socket transport: connect, send one GET, read until peer close.
//!
//! # Design
//! Every call owns exactly one TCP socket (wrapped in a TLS session for
//! `https`). The stream lives in a local and is dropped on every return
//! path, so the socket is closed before the caller sees the result. There
//! is no length or chunked-encoding awareness: the response ends when the
//! peer closes its side.

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use log::debug;
use rustls::{ClientConnection, StreamOwned};

use crate::cancel::CancellationToken;
use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::http::{HttpRequest, HttpResponse};
use crate::response::ResponseReader;
use crate::tls;
use crate::url::ParsedUrl;

const READ_CHUNK: usize = 4096;

/// A connected socket, plain or TLS-wrapped.
enum Stream {
    Plain(TcpStream),
    Tls(Box<StreamOwned<ClientConnection, TcpStream>>),
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Stream::Plain(s) => s.read(buf),
            Stream::Tls(s) => s.read(buf),
        }
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Stream::Plain(s) => s.write(buf),
            Stream::Tls(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Stream::Plain(s) => s.flush(),
            Stream::Tls(s) => s.flush(),
        }
    }
}

/// Fetch `url` and return the full response if its status matches
/// `config.expected_status`.
pub fn fetch(
    url: &ParsedUrl,
    config: &FetchConfig,
    cancel: &CancellationToken,
) -> Result<HttpResponse, FetchError> {
    if cancel.is_cancelled() {
        return Err(FetchError::Cancelled);
    }

    let request = HttpRequest::get(url, config);
    let mut stream = open(url, config.timeout)?;

    stream
        .write_all(&request.to_bytes())
        .and_then(|()| stream.flush())
        .map_err(FetchError::Transport)?;
    debug!("sent GET {} to {}:{}", request.path, url.host, url.port);

    let response = read_response(&mut stream, cancel)?;
    debug!(
        "{} answered {} with {} body bytes",
        url,
        response.status,
        response.body.len()
    );

    if response.status != config.expected_status {
        return Err(FetchError::UnsuccessfulStatus {
            status: response.status,
            expected: config.expected_status,
        });
    }
    Ok(response)
}

/// Parse `url` and fetch it, returning only the body.
pub fn fetch_body(
    url: &str,
    config: &FetchConfig,
    cancel: &CancellationToken,
) -> Result<Vec<u8>, FetchError> {
    let url = ParsedUrl::parse(url)?;
    fetch(&url, config, cancel).map(|response| response.body)
}

/// Body of `url`, or `None` on any failure.
pub fn retrieve(url: &str, config: &FetchConfig) -> Option<Vec<u8>> {
    fetch_body(url, config, &CancellationToken::new())
        .inspect_err(|e| debug!("retrieving {url} failed: {e}"))
        .ok()
}

/// `retrieve` with the default configuration.
pub fn retrieve_url(url: &str) -> Option<Vec<u8>> {
    retrieve(url, &FetchConfig::default())
}

fn open(url: &ParsedUrl, timeout: Duration) -> Result<Stream, FetchError> {
    let mut tcp = connect_tcp(&url.host, url.port, timeout)?;
    if !url.is_tls() {
        return Ok(Stream::Plain(tcp));
    }

    let mut conn = tls::connect(&url.host)?;
    while conn.is_handshaking() {
        conn.complete_io(&mut tcp).map_err(handshake_error)?;
    }
    debug!("TLS session established with {}", url.host);
    Ok(Stream::Tls(Box::new(StreamOwned::new(conn, tcp))))
}

/// rustls reports protocol and certificate failures as `InvalidData`.
fn handshake_error(err: io::Error) -> FetchError {
    if err.kind() == io::ErrorKind::InvalidData {
        FetchError::Tls(err.to_string())
    } else {
        FetchError::Transport(err)
    }
}

fn connect_tcp(host: &str, port: u16, timeout: Duration) -> Result<TcpStream, FetchError> {
    let connect_error = |source| FetchError::Connect {
        host: host.to_string(),
        port,
        source,
    };

    // A zero timeout means "block indefinitely"; std rejects zero durations.
    let limit = (!timeout.is_zero()).then_some(timeout);
    let addrs = (host, port).to_socket_addrs().map_err(connect_error)?;
    let mut last_error = None;
    for addr in addrs {
        debug!("connecting to {addr}");
        let attempt = match limit {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
            None => TcpStream::connect(addr),
        };
        match attempt {
            Ok(stream) => {
                stream
                    .set_read_timeout(limit)
                    .and_then(|()| stream.set_write_timeout(limit))
                    .map_err(FetchError::Transport)?;
                return Ok(stream);
            }
            Err(e) => {
                debug!("connect to {addr} failed: {e}");
                last_error = Some(e);
            }
        }
    }
    Err(connect_error(last_error.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "host resolved to no addresses")
    })))
}

/// Drain `stream` until a zero-length read and split the result.
fn read_response<R: Read>(
    stream: &mut R,
    cancel: &CancellationToken,
) -> Result<HttpResponse, FetchError> {
    let mut reader = ResponseReader::new();
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => reader.push(&chunk[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            // TLS peer closed the socket without close_notify.
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                debug!("peer closed without close_notify after {} bytes", reader.len());
                break;
            }
            Err(e) => return Err(FetchError::Transport(e)),
        }
    }
    reader.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Hands out the wrapped bytes a few at a time, then fails with `tail`.
    struct Trickle {
        data: Cursor<Vec<u8>>,
        step: usize,
        tail: Option<io::ErrorKind>,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let limit = buf.len().min(self.step);
            let n = self.data.read(&mut buf[..limit])?;
            if n > 0 {
                return Ok(n);
            }
            match self.tail.take() {
                Some(kind) => Err(io::Error::from(kind)),
                None => Ok(0),
            }
        }
    }

    fn trickle(data: &[u8], tail: Option<io::ErrorKind>) -> Trickle {
        Trickle {
            data: Cursor::new(data.to_vec()),
            step: 3,
            tail,
        }
    }

    #[test]
    fn reads_until_eof() {
        let mut stream = trickle(b"HTTP/1.1 200 OK\r\nX: y\r\n\r\nbody", None);
        let response = read_response(&mut stream, &CancellationToken::new()).unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"body");
    }

    #[test]
    fn unexpected_eof_ends_the_response() {
        let mut stream = trickle(b"HTTP/1.1 200 OK\r\n\r\nabc", Some(io::ErrorKind::UnexpectedEof));
        let response = read_response(&mut stream, &CancellationToken::new()).unwrap();
        assert_eq!(response.body, b"abc");
    }

    #[test]
    fn read_errors_are_transport_errors() {
        let mut stream = trickle(b"HTTP/1.1 200 OK\r\n", Some(io::ErrorKind::ConnectionReset));
        let err = read_response(&mut stream, &CancellationToken::new()).unwrap_err();
        assert!(matches!(err, FetchError::Transport(e) if e.kind() == io::ErrorKind::ConnectionReset));
    }

    #[test]
    fn cancelled_read_stops() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut stream = trickle(b"HTTP/1.1 200 OK\r\n\r\n", None);
        assert!(matches!(read_response(&mut stream, &cancel), Err(FetchError::Cancelled)));
    }

    #[test]
    fn fetch_checks_cancellation_before_connecting() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let url = ParsedUrl::parse("http://192.0.2.1:9/").unwrap();
        assert!(matches!(
            fetch(&url, &FetchConfig::default(), &cancel),
            Err(FetchError::Cancelled)
        ));
    }

    #[test]
    fn invalid_url_is_reported_before_io() {
        let err = fetch_body("example.com", &FetchConfig::default(), &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
        assert_eq!(retrieve_url("gopher://example.com"), None);
    }

    #[test]
    fn handshake_errors_are_classified() {
        let err = handshake_error(io::Error::new(io::ErrorKind::InvalidData, "bad cert"));
        assert!(matches!(err, FetchError::Tls(_)));
        let err = handshake_error(io::Error::from(io::ErrorKind::TimedOut));
        assert!(matches!(err, FetchError::Transport(_)));
    }
}
