//! URL decomposition into scheme, host, port and path.
//!
//! # Design
//! Only the `scheme://host[:port][/path]` shape is understood. The path keeps
//! any query string verbatim; there is no percent-decoding and no userinfo
//! handling. Unknown schemes are rejected up front instead of producing a
//! `ParsedUrl` without a usable port.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UrlError;

/// The two schemes the fetcher can speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl FromStr for Scheme {
    type Err = UrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("http") {
            Ok(Scheme::Http)
        } else if s.eq_ignore_ascii_case("https") {
            Ok(Scheme::Https)
        } else {
            Err(UrlError::UnsupportedScheme(s.to_string()))
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A URL broken into the pieces needed to open a socket and write a
/// request line.
///
/// `port` is always set (the scheme default when the URL omits it) and
/// `path` always starts with `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParsedUrl {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl ParsedUrl {
    pub fn parse(input: &str) -> Result<Self, UrlError> {
        let (scheme, rest) = input.split_once("://").ok_or(UrlError::MissingScheme)?;
        let scheme: Scheme = scheme.parse()?;

        // A query directly after the authority ("host?q=1") still starts the path.
        let (authority, path) = match rest.find(['/', '?']) {
            Some(idx) if rest.as_bytes()[idx] == b'/' => (&rest[..idx], rest[idx..].to_string()),
            Some(idx) => (&rest[..idx], format!("/{}", &rest[idx..])),
            None => (rest, "/".to_string()),
        };

        let (host, port) = match authority.split_once(':') {
            Some((host, port)) => (host, parse_port(port)?),
            None => (authority, scheme.default_port()),
        };
        if host.is_empty() {
            return Err(UrlError::MissingHost);
        }

        Ok(Self {
            scheme,
            host: host.to_string(),
            port,
            path,
        })
    }

    pub fn is_tls(&self) -> bool {
        self.scheme == Scheme::Https
    }
}

fn parse_port(raw: &str) -> Result<u16, UrlError> {
    match raw.parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(UrlError::InvalidPort(raw.to_string())),
    }
}

impl FromStr for ParsedUrl {
    type Err = UrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParsedUrl::parse(s)
    }
}

impl fmt::Display for ParsedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}{}", self.scheme, self.host, self.port, self.path)
    }
}

/// Loose syntactic check: a scheme, `://`, and a non-empty authority.
///
/// Unlike `ParsedUrl::parse` this accepts any well-formed scheme, so
/// `ftp://host` is valid here even though it cannot be fetched.
pub fn is_valid_url(url: &str) -> bool {
    let Some((scheme, rest)) = url.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    let scheme_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    let authority = rest.split(['/', '?', '#']).next().unwrap_or("");
    scheme_ok && !authority.is_empty()
}
