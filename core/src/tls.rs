//! TLS client configuration backed by the OS trust store.
//!
//! Root certificates are loaded from the platform store once per process
//! and the resulting `ClientConfig` is shared by every HTTPS fetch.

use std::sync::{Arc, OnceLock};

use log::{debug, warn};
use rustls::pki_types::{CertificateDer, ServerName};
use rustls::{ClientConfig, ClientConnection, RootCertStore};

use crate::error::FetchError;

static NATIVE_ROOTS: OnceLock<Vec<CertificateDer<'static>>> = OnceLock::new();
static CLIENT_CONFIG: OnceLock<Result<Arc<ClientConfig>, String>> = OnceLock::new();

/// Empty when the store could not be read; loading problems are logged, not
/// returned.
fn load_native_roots() -> Vec<CertificateDer<'static>> {
    let result = rustls_native_certs::load_native_certs();
    for err in &result.errors {
        warn!("error loading native root certificate: {err}");
    }
    if result.certs.is_empty() {
        warn!("no native root CA certificates found");
    } else {
        debug!("loaded {} native root certificates", result.certs.len());
    }
    result.certs
}

pub fn native_root_certs() -> &'static [CertificateDer<'static>] {
    NATIVE_ROOTS.get_or_init(load_native_roots).as_slice()
}

fn build_client_config() -> Result<Arc<ClientConfig>, String> {
    let certs = native_root_certs();
    if certs.is_empty() {
        return Err("no native root CA certificates found in OS certificate store".to_string());
    }

    let mut roots = RootCertStore::empty();
    let (added, ignored) = roots.add_parsable_certificates(certs.iter().cloned());
    if ignored > 0 {
        warn!("{ignored} native root certificates could not be parsed");
    }
    if added == 0 {
        return Err(format!(
            "no valid native root CA certificates parsed (found {}, all failed to parse)",
            certs.len()
        ));
    }

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| format!("failed to set TLS protocol versions: {e}"))?
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(Arc::new(config))
}

/// Shared client config; the error is cached too, so a machine without a
/// trust store fails every HTTPS fetch the same way.
pub fn client_config() -> Result<Arc<ClientConfig>, FetchError> {
    CLIENT_CONFIG
        .get_or_init(build_client_config)
        .clone()
        .map_err(FetchError::Tls)
}

/// Client-side TLS session for `host`, verified against the native roots.
pub fn connect(host: &str) -> Result<ClientConnection, FetchError> {
    let server_name = ServerName::try_from(host.to_string())
        .map_err(|e| FetchError::Tls(format!("invalid server name `{host}`: {e}")))?;
    ClientConnection::new(client_config()?, server_name).map_err(|e| FetchError::Tls(e.to_string()))
}
