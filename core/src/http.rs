//! HTTP request and response types.
//!
//! # Design
//! `HttpRequest` is plain data plus a `Display` impl that renders the exact
//! bytes written to the socket. Building it touches no I/O, so request
//! formatting is tested without a network; the transport only ever sees
//! the rendered text.

use std::collections::HashMap;
use std::fmt;

use crate::config::FetchConfig;
use crate::url::ParsedUrl;

/// A single-use HTTP/1.1 GET request.
///
/// Renders as
/// `GET <path> HTTP/1.1\r\nHost: <host>:<port>\r\n[User-Agent]\r\n[Authorization]\r\nConnection: close\r\n\r\n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub host: String,
    pub port: u16,
    pub path: String,
    pub user_agent: Option<String>,
    pub authorization: Option<String>,
}

impl HttpRequest {
    pub fn new(host: &str, port: u16, path: &str) -> Self {
        Self {
            host: host.to_string(),
            port,
            path: normalize_path(path),
            user_agent: None,
            authorization: None,
        }
    }

    /// Request for `url` carrying the optional headers from `config`.
    pub fn get(url: &ParsedUrl, config: &FetchConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            authorization: config.authorization.clone(),
            ..Self::new(&url.host, url.port, &url.path)
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GET {} HTTP/1.1\r\n", self.path)?;
        write!(f, "Host: {}:{}\r\n", self.host, self.port)?;
        if let Some(user_agent) = &self.user_agent {
            write!(f, "User-Agent: {user_agent}\r\n")?;
        }
        if let Some(authorization) = &self.authorization {
            write!(f, "Authorization: {authorization}\r\n")?;
        }
        f.write_str("Connection: close\r\n\r\n")
    }
}

/// Render a GET request from its parts.
pub fn format_get_request(
    host: &str,
    port: u16,
    path: &str,
    user_agent: Option<&str>,
    authorization: Option<&str>,
) -> String {
    HttpRequest {
        user_agent: user_agent.map(str::to_string),
        authorization: authorization.map(str::to_string),
        ..HttpRequest::new(host, port, path)
    }
    .to_string()
}

fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// A response split into status, headers and body.
///
/// Header names keep the case the server sent; a repeated header keeps the
/// last value seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}
