//! Raw HTTP fetching
//!
//! This module performs single HTTP requests for the probes, including:
//! - Building HTTP clients with the configured user agent and timeouts
//! - GET requests with query parameters, POST requests with form bodies
//! - Best-effort cancellation through a [`CancellationToken`]
//! - Error classification into network, security and cancellation failures

use crate::config::ClientConfig;
use crate::fetch::FetchError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// HTTP method of a probe request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// One request as seen by every fetch layer
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Target URL without the request parameters
    pub url: String,

    pub method: Method,

    /// Query parameters (GET) or form fields (POST)
    pub params: Vec<(String, String)>,

    /// The URL already points at a proxy page
    pub as_proxy: bool,

    /// Force a fresh authentication probe before dispatch
    pub force_auth: bool,

    /// Cancelling this token abandons the request
    pub cancel: CancellationToken,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(url, Method::Get)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(url, Method::Post)
    }

    fn new(url: impl Into<String>, method: Method) -> Self {
        Self {
            url: url.into(),
            method,
            params: Vec::new(),
            as_proxy: false,
            force_auth: false,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn forcing_auth(mut self) -> Self {
        self.force_auth = true;
        self
    }

    /// URL including encoded query parameters for GET requests
    ///
    /// # Examples
    ///
    /// ```
    /// use catalog_ripple::fetch::FetchRequest;
    ///
    /// let request = FetchRequest::get("https://gis.example.com/arcgis/rest/services")
    ///     .with_param("f", "json");
    /// assert_eq!(request.full_url(), "https://gis.example.com/arcgis/rest/services?f=json");
    /// ```
    pub fn full_url(&self) -> String {
        if self.method == Method::Post || self.params.is_empty() {
            return self.url.clone();
        }

        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.params)
            .finish();
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.url, separator, query)
    }
}

/// A single-shot fetcher: no retries, no authentication logic
#[async_trait]
pub trait RawFetcher: Send + Sync {
    /// Performs the request and returns the response body
    async fn fetch(&self, request: &FetchRequest) -> Result<String, FetchError>;
}

/// Builds an HTTP client with the configured identity and timeouts
///
/// # Arguments
///
/// * `config` - The client configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use catalog_ripple::config::ClientConfig;
/// use catalog_ripple::fetch::build_http_client;
///
/// let client = build_http_client(&ClientConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &ClientConfig) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(config.user_agent.as_str())
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true);

    if config.request_timeout_secs > 0 {
        builder = builder.timeout(Duration::from_secs(config.request_timeout_secs));
    }

    builder.build()
}

/// [`RawFetcher`] backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RawFetcher for HttpFetcher {
    /// Fetches a URL and classifies failures
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | 2xx | body |
    /// | HTTP 401, 403, 407 | `Security` |
    /// | other HTTP status | `Network` with status |
    /// | timeout, connection failure | `Network` |
    /// | token cancelled | `Cancelled` |
    async fn fetch(&self, request: &FetchRequest) -> Result<String, FetchError> {
        let url = request.full_url();
        tracing::trace!("{:?} {}", request.method, url);

        let builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&request.url).form(&request.params),
        };

        let response = tokio::select! {
            _ = request.cancel.cancelled() => return Err(FetchError::Cancelled),
            result = builder.send() => result.map_err(|e| classify_error(&url, &e))?,
        };

        let status = response.status();
        if let Some(error) = classify_status(&url, status) {
            return Err(error);
        }

        tokio::select! {
            _ = request.cancel.cancelled() => Err(FetchError::Cancelled),
            body = response.text() => body.map_err(|e| classify_error(&url, &e)),
        }
    }
}

/// Maps a non-success status to a fetch error
fn classify_status(url: &str, status: StatusCode) -> Option<FetchError> {
    if status.is_success() {
        return None;
    }

    match status {
        StatusCode::UNAUTHORIZED
        | StatusCode::FORBIDDEN
        | StatusCode::PROXY_AUTHENTICATION_REQUIRED => Some(FetchError::Security {
            url: url.to_string(),
            message: format!("HTTP {}", status.as_u16()),
        }),
        _ => Some(FetchError::Network {
            url: url.to_string(),
            message: format!("HTTP {}", status.as_u16()),
            status: Some(status.as_u16()),
        }),
    }
}

fn classify_error(url: &str, error: &reqwest::Error) -> FetchError {
    let message = if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        format!("Connection failed: {}", error)
    } else {
        error.to_string()
    };

    FetchError::Network {
        url: url.to_string(),
        message,
        status: error.status().map(|s| s.as_u16()),
    }
}
