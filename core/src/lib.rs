//! Minimal HTTP/1.1 document retrieval over raw TCP and TLS sockets.
//!
//! # Overview
//! A URL is decomposed into scheme, host, port and path; a GET request is
//! formatted by hand; the response is read from the socket until the peer
//! closes it; the body is returned if the status matches what the caller
//! expected. A retry wrapper adds exponential backoff on top.
//!
//! # Design
//! - Request formatting (`http`) and response parsing (`response`) are pure
//!   and never touch the network. Only `transport` does I/O.
//! - Every fetch opens exactly one socket and closes it before returning.
//! - Failures are typed (`FetchError`) so the retry loop can stop early on
//!   a malformed URL. `retrieve`/`retrieve_url` collapse every failure into
//!   `None` for callers that only care about the body.
//! - A `CancellationToken` aborts backoff sleeps and read loops from
//!   another thread.

pub mod auth;
pub mod cancel;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod rate;
pub mod response;
pub mod retry;
pub mod tls;
pub mod transport;
pub mod url;

pub use auth::basic_auth;
pub use cancel::CancellationToken;
pub use client::Client;
pub use config::{FetchConfig, RetryPolicy};
pub use error::{FetchError, UrlError};
pub use http::{format_get_request, HttpRequest, HttpResponse};
pub use rate::RateLimiter;
pub use response::{extract_body, is_successful, parse_headers, status_code, ResponseReader, ResponseState};
pub use retry::{backoff_delay, retry, retry_fetch, retry_request};
pub use transport::{fetch, fetch_body, retrieve, retrieve_url};
pub use url::{is_valid_url, ParsedUrl, Scheme};
