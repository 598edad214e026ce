use serde::Deserialize;

/// Main configuration structure for Catalog-Ripple
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub credentials: Vec<CredentialEntry>,
}

/// HTTP client and request-dispatch configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ClientConfig {
    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Per-request timeout in seconds (0 disables it)
    pub request_timeout_secs: u64,

    /// Connection establishment timeout in seconds
    pub connect_timeout_secs: u64,

    /// Whether https origins get a one-time authentication probe
    pub auth_probe: bool,

    /// How long queued requests wait on an authentication probe
    pub auth_probe_timeout_secs: u64,

    /// Proxy page used when a host rejects direct requests
    pub proxy_url: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("CatalogRipple/{}", env!("CARGO_PKG_VERSION")),
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            auth_probe: true,
            auth_probe_timeout_secs: 10,
            proxy_url: None,
        }
    }
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlConfig {
    /// Filter flag names (e.g. "cached-services")
    pub filter: Vec<String>,

    /// Depth of tree expansion below the root level
    pub max_depth: u32,

    /// Username used when looking up tokens in the credential store
    pub username: Option<String>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            filter: Vec::new(),
            max_depth: 3,
            username: None,
        }
    }
}

/// Token entry for the static credential store
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialEntry {
    /// Host pattern (e.g., "gis.example.com" or "*.example.com")
    pub host: String,

    /// Username the token belongs to; matches any username when absent
    #[serde(default)]
    pub username: Option<String>,

    /// Token appended to authenticated requests
    pub token: String,
}
