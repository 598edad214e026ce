//! Proxy fallback for rejected requests
//!
//! Hosts that refuse direct access can often be reached through a proxy
//! page that forwards the request. The fallback rewrites the request as
//! `{proxy}?{target}` and retries it once.

use crate::fetch::{FetchError, FetchRequest, RawFetcher};
use std::sync::Arc;

/// Response body plus how it was obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub body: String,

    /// The body came through the proxy rather than directly
    pub used_proxy: bool,
}

/// How a request should reach its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    /// Direct first; on a security rejection retry once through the proxy
    Direct { fallback: Option<&'a str> },

    /// Always through the proxy (the host is already known to need it)
    Proxied(&'a str),
}

impl<'a> Route<'a> {
    /// Route for a resource that may carry a known proxy and a fallback proxy
    ///
    /// A known proxy wins: once a host required one, later requests go
    /// straight through it.
    pub fn for_resource(known_proxy: Option<&'a str>, fallback: Option<&'a str>) -> Self {
        match known_proxy {
            Some(proxy) => Route::Proxied(proxy),
            None => Route::Direct { fallback },
        }
    }
}

/// Rewrites a request so that it goes through a proxy page
///
/// # Examples
///
/// ```
/// use catalog_ripple::fetch::{proxied_request, FetchRequest};
///
/// let request = FetchRequest::get("https://gis.example.com/arcgis/rest/services")
///     .with_param("f", "json");
/// let proxied = proxied_request(&request, "https://proxy.example.com/proxy.ashx");
/// assert!(proxied.as_proxy);
/// assert_eq!(
///     proxied.full_url(),
///     "https://proxy.example.com/proxy.ashx?https://gis.example.com/arcgis/rest/services?f=json"
/// );
/// ```
pub fn proxied_request(request: &FetchRequest, proxy_url: &str) -> FetchRequest {
    let target = request.full_url();
    let url = format!("{}?{}", proxy_url.trim_end_matches('?'), target);

    let mut proxied = request.clone();
    proxied.url = url;
    proxied.as_proxy = true;
    // GET parameters now live inside the proxied target
    if proxied.method == crate::fetch::Method::Get {
        proxied.params.clear();
    }
    proxied
}

/// Fetcher that retries once through a proxy on security rejections
#[derive(Clone)]
pub struct ProxyFallbackFetcher {
    inner: Arc<dyn RawFetcher>,
}

impl ProxyFallbackFetcher {
    pub fn new(inner: Arc<dyn RawFetcher>) -> Self {
        Self { inner }
    }

    /// Fetches with an optional fallback proxy
    ///
    /// # Arguments
    ///
    /// * `request` - The request to issue
    /// * `proxy_url` - Proxy page to retry through; `None` disables the retry
    ///
    /// # Returns
    ///
    /// * `Ok(FetchResponse)` - Body, tagged with `used_proxy` when the retry
    ///   produced it
    /// * `Err(FetchError)` - The direct error when no retry applied, or the
    ///   retry's own error
    pub async fn fetch(
        &self,
        request: &FetchRequest,
        proxy_url: Option<&str>,
    ) -> Result<FetchResponse, FetchError> {
        self.fetch_via(request, Route::Direct { fallback: proxy_url })
            .await
    }

    /// Fetches along an explicit route
    pub async fn fetch_via(
        &self,
        request: &FetchRequest,
        route: Route<'_>,
    ) -> Result<FetchResponse, FetchError> {
        match route {
            Route::Proxied(proxy) if !request.as_proxy => {
                let body = self.inner.fetch(&proxied_request(request, proxy)).await?;
                Ok(FetchResponse {
                    body,
                    used_proxy: true,
                })
            }
            Route::Proxied(_) => self.direct(request).await,
            Route::Direct { fallback } => match self.direct(request).await {
                Err(FetchError::Security { url, message }) => match fallback {
                    Some(proxy) if !request.as_proxy => {
                        tracing::warn!(
                            "Request to {} rejected ({}), retrying through {}",
                            url,
                            message,
                            proxy
                        );
                        let body = self.inner.fetch(&proxied_request(request, proxy)).await?;
                        Ok(FetchResponse {
                            body,
                            used_proxy: true,
                        })
                    }
                    _ => Err(FetchError::Security { url, message }),
                },
                other => other,
            },
        }
    }

    async fn direct(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        let body = self.inner.fetch(request).await?;
        Ok(FetchResponse {
            body,
            used_proxy: request.as_proxy,
        })
    }
}
