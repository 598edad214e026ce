//! Descriptor probes
//!
//! Each probe issues one request through the proxy fallback layer (node URL
//! plus `f=json` and a token when the credential store has one), parses the
//! body into its wire shape and maps it into child [`Resource`]s.
//!
//! - [`server`]: services directory and folder catalogs, instance info
//! - [`service`]: service roots and their layers and tables
//! - [`layer`]: layer details, group sublayers and fields
//! - [`cache`]: the process-wide [`ServerInfo`](crate::ServerInfo) cache

pub mod cache;
mod layer;
mod parse;
mod server;
mod service;

pub use cache::{EvictionPolicy, MaxAge, NeverEvict, ServerInfoCache};
pub use layer::{classify_layer, field_children, sublayer_urls};
pub use parse::parse_descriptor;
pub use server::catalog_children;
pub use service::service_children;

use crate::credentials::{CredentialStore, NoCredentials};
use crate::fetch::{FetchRequest, ProxyFallbackFetcher, RawFetcher, Route};
use crate::model::Resource;
use crate::Result;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A parsed response and how it was reached
#[derive(Debug, Clone)]
pub struct Descriptor<T> {
    pub value: T,

    /// Proxy the response came through, if any
    pub proxy_url: Option<String>,
}

impl<T> Descriptor<T> {
    pub fn used_proxy(&self) -> bool {
        self.proxy_url.is_some()
    }
}

/// A layer-level child together with what the filter needs to judge it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerChild {
    pub resource: Resource,

    /// `Some(false)` for tables and geometry-less layers, `None` if unknown
    pub is_spatial: Option<bool>,
}

/// Issues descriptor requests on behalf of the crawler
#[derive(Clone)]
pub struct DescriptorClient {
    fetcher: ProxyFallbackFetcher,
    credentials: Arc<dyn CredentialStore>,
    username: Option<String>,
}

impl DescriptorClient {
    pub fn new(fetcher: Arc<dyn RawFetcher>) -> Self {
        Self {
            fetcher: ProxyFallbackFetcher::new(fetcher),
            credentials: Arc::new(NoCredentials),
            username: None,
        }
    }

    pub fn with_credentials(
        mut self,
        credentials: Arc<dyn CredentialStore>,
        username: Option<String>,
    ) -> Self {
        self.credentials = credentials;
        self.username = username;
        self
    }

    /// Fetches `{url}?f=json` and parses it as `T`
    ///
    /// # Arguments
    ///
    /// * `url` - Node URL without query string
    /// * `route` - Direct with optional fallback, or through a known proxy
    /// * `cancel` - Cancels the underlying request
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        route: Route<'_>,
        cancel: &CancellationToken,
    ) -> Result<Descriptor<T>> {
        let mut request = FetchRequest::get(url)
            .with_param("f", "json")
            .with_cancel(cancel.clone());

        if let Some(token) = crate::url::host_of(url)
            .and_then(|host| self.credentials.token_for(&host, self.username.as_deref()))
        {
            request = request.with_param("token", token);
        }

        tracing::debug!("Probing {}", url);
        let response = self.fetcher.fetch_via(&request, route).await?;
        let value = parse_descriptor(url, &response.body)?;

        let proxy_url = if response.used_proxy {
            match route {
                Route::Proxied(proxy) => Some(proxy.to_string()),
                Route::Direct { fallback } => fallback.map(str::to_string),
            }
        } else {
            None
        };

        Ok(Descriptor { value, proxy_url })
    }

    /// Fetches a resource's own descriptor, reusing its known proxy
    pub(crate) async fn describe<T: DeserializeOwned>(
        &self,
        resource: &Resource,
        fallback_proxy: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Descriptor<T>> {
        let route = Route::for_resource(resource.proxy_url.as_deref(), fallback_proxy);
        self.get_json(&resource.url, route, cancel).await
    }
}
