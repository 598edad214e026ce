//! Request dispatch for catalog probes
//!
//! Requests flow through three layers:
//! - [`HttpFetcher`]: one HTTP GET/POST, no retries
//! - [`AuthGate`]: single-flight authentication probe per https origin,
//!   queueing requests issued while a probe is in flight
//! - [`ProxyFallbackFetcher`]: one retry through a proxy page when the host
//!   rejects a direct request

mod auth_gate;
mod proxy;
mod raw;

pub use auth_gate::{AuthGate, AuthProbe, GatePhase, HttpAuthProbe};
pub use proxy::{proxied_request, FetchResponse, ProxyFallbackFetcher, Route};
pub use raw::{build_http_client, FetchRequest, HttpFetcher, Method, RawFetcher};

use crate::config::ClientConfig;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Failures reported by the fetch layers
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Transport failure or unexpected HTTP status
    #[error("Network error for {url}: {message}")]
    Network {
        url: String,
        message: String,
        status: Option<u16>,
    },

    /// The host refused the request for access-control reasons
    #[error("Request to {url} was rejected: {message}")]
    Security { url: String, message: String },

    #[error("Request cancelled")]
    Cancelled,
}

/// Assembles the default fetch stack from client configuration
///
/// The HTTP fetcher is wrapped in an [`AuthGate`] when `auth-probe` is
/// enabled; the proxy layer is added per request by the descriptor client.
pub fn build_fetch_stack(config: &ClientConfig) -> Result<Arc<dyn RawFetcher>, reqwest::Error> {
    let client = build_http_client(config)?;
    let http = HttpFetcher::new(client.clone());

    if config.auth_probe {
        let probe = Arc::new(HttpAuthProbe::new(client));
        Ok(Arc::new(AuthGate::new(
            http,
            probe,
            Duration::from_secs(config.auth_probe_timeout_secs),
        )))
    } else {
        Ok(Arc::new(http))
    }
}
