//! Error types for URL decomposition and document retrieval.
//!
//! # Design
//! `UrlError` covers everything the decomposer can reject. `FetchError`
//! wraps it alongside the transport-level failures so the retry loop can
//! tell a malformed URL (never worth retrying) from a refused connection
//! or a bad status (worth another attempt).

use std::io;

use thiserror::Error;

/// Reasons a URL string cannot be decomposed into a `ParsedUrl`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    /// No `://` separator was found.
    #[error("missing scheme separator `://`")]
    MissingScheme,

    /// The scheme is present but is neither `http` nor `https`.
    #[error("unsupported scheme `{0}`")]
    UnsupportedScheme(String),

    /// Nothing between `://` and the port or path.
    #[error("missing host")]
    MissingHost,

    /// The port is not an integer in 1..=65535.
    #[error("invalid port `{0}`")]
    InvalidPort(String),
}

/// Errors returned by the fetcher and the retry wrapper.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] UrlError),

    /// DNS resolution, TCP connect, or connect timeout failed.
    #[error("could not connect to {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// Send or receive failed after the connection was established.
    #[error("transport error: {0}")]
    Transport(#[source] io::Error),

    /// TLS configuration, handshake, or certificate validation failed.
    #[error("TLS error: {0}")]
    Tls(String),

    #[error("unexpected status {status} (expected {expected})")]
    UnsuccessfulStatus { status: u16, expected: u16 },

    /// The peer closed the connection before a parseable status line and
    /// header block arrived.
    #[error("malformed HTTP response")]
    MalformedResponse,

    #[error("operation cancelled")]
    Cancelled,
}

impl FetchError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Parse failures and cancellation are final; everything that happened
    /// on the wire is retried.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FetchError::InvalidUrl(_) | FetchError::Cancelled)
    }
}
