//! Incremental response accumulation and minimal HTTP/1.1 response parsing.
//!
//! # Design
//! The fetcher never knows the body length up front: a response ends when
//! the peer closes the socket. `ResponseReader` therefore just accumulates
//! chunks, but it locates the end of the header block as bytes arrive,
//! scanning only the newly appended region (plus a three-byte overlap for
//! terminators split across reads). When the stream ends, the body is split
//! off at the recorded offset without another search.
//!
//! The free functions operate on a complete response buffer and are kept
//! for callers that hold raw bytes from elsewhere.

use std::collections::HashMap;

use crate::error::FetchError;
use crate::http::HttpResponse;

const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// How much of the response has been seen so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseState {
    /// The blank line ending the header block has not arrived yet.
    #[default]
    Incomplete,
    /// Status line and headers occupy the first `head_len` bytes,
    /// terminator included; everything after is body.
    HeadComplete { head_len: usize },
}

#[derive(Debug, Default)]
pub struct ResponseReader {
    buf: Vec<u8>,
    state: ResponseState,
    scanned: usize,
}

impl ResponseReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
        if self.state == ResponseState::Incomplete {
            let from = self.scanned.saturating_sub(HEAD_TERMINATOR.len() - 1);
            if let Some(pos) = find_head_terminator(&self.buf[from..]) {
                self.state = ResponseState::HeadComplete {
                    head_len: from + pos + HEAD_TERMINATOR.len(),
                };
            }
            self.scanned = self.buf.len();
        }
    }

    pub fn state(&self) -> ResponseState {
        self.state
    }

    /// Bytes received so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Split the accumulated bytes into an `HttpResponse`.
    ///
    /// Fails with `MalformedResponse` if the header block never completed
    /// or the status line is not `HTTP/<version> <3-digit code> ...`.
    pub fn finish(mut self) -> Result<HttpResponse, FetchError> {
        let ResponseState::HeadComplete { head_len } = self.state else {
            return Err(FetchError::MalformedResponse);
        };
        let head = &self.buf[..head_len];
        let status = status_code(head).ok_or(FetchError::MalformedResponse)?;
        let headers = parse_headers(head);
        let body = self.buf.split_off(head_len);
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn find_head_terminator(bytes: &[u8]) -> Option<usize> {
    bytes
        .windows(HEAD_TERMINATOR.len())
        .position(|window| window == HEAD_TERMINATOR)
}

/// Numeric status code from the status line, if it looks like HTTP.
pub fn status_code(response: &[u8]) -> Option<u16> {
    let line_end = response
        .windows(2)
        .position(|w| w == b"\r\n")
        .unwrap_or(response.len());
    let line = std::str::from_utf8(&response[..line_end]).ok()?;
    let mut parts = line.split(' ');
    if !parts.next()?.starts_with("HTTP/") {
        return None;
    }
    let code = parts.next()?;
    if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    code.parse().ok()
}

/// Whether the response's status code equals `expected`.
pub fn is_successful(response: &[u8], expected: u16) -> bool {
    status_code(response) == Some(expected)
}

/// Header name/value pairs between the status line and the first blank line.
///
/// Lines without a colon are ignored. Values are trimmed; names are kept
/// as sent.
pub fn parse_headers(response: &[u8]) -> HashMap<String, String> {
    let head_end = find_head_terminator(response).unwrap_or(response.len());
    let head = String::from_utf8_lossy(&response[..head_end]);
    head.split("\r\n")
        .skip(1)
        .take_while(|line| !line.is_empty())
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Everything after the first `\r\n\r\n`, or `None` if there is no header
/// terminator.
pub fn extract_body(response: &[u8]) -> Option<&[u8]> {
    find_head_terminator(response).map(|pos| &response[pos + HEAD_TERMINATOR.len()..])
}
