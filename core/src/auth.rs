use base64::{engine::general_purpose, Engine as _};

/// Build an `Authorization` header value for HTTP Basic authentication.
///
/// No validation is done on `username`; a colon in it produces a value the
/// server will split in the wrong place.
pub fn basic_auth(username: &str, password: &str) -> String {
    let encoded = general_purpose::STANDARD.encode(format!("{username}:{password}"));
    format!("Basic {encoded}")
}
