//! HTTP client initialization.

use std::time::Duration;

use reqwest::ClientBuilder;

use crate::config::API_TIMEOUT;
use crate::error_handling::InitializationError;
use crate::verify::{client_config, TlsPolicy};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Initializes the client used for the relay API.
///
/// # Errors
///
/// Returns `InitializationError::HttpClientError` if client creation fails.
pub fn init_api_client() -> Result<reqwest::Client, InitializationError> {
    let client = ClientBuilder::new()
        .timeout(API_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Initializes a client for verification probes.
///
/// TLS follows `tls`; with `proxy` set, every request goes through it.
///
/// # Errors
///
/// Fails when the TLS configuration cannot be built (for example an
/// unreadable CA bundle) or the client cannot be created.
pub fn init_probe_client(
    timeout: Duration,
    tls: &TlsPolicy,
    proxy: Option<reqwest::Proxy>,
) -> Result<reqwest::Client, InitializationError> {
    let tls_config = client_config(tls)?;
    let mut builder = ClientBuilder::new()
        .timeout(timeout)
        .connect_timeout(timeout)
        .user_agent(USER_AGENT)
        .use_preconfigured_tls((*tls_config).clone());
    builder = match proxy {
        Some(proxy) => builder.proxy(proxy),
        None => builder.no_proxy(),
    };
    Ok(builder.build()?)
}
