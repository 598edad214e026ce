use serde::Serialize;

/// Authentication capabilities reported by a server's info endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthenticationInfo {
    pub supports_token_authentication: bool,
    pub token_services_url: Option<String>,
}

/// Resolved metadata about a catalog host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerInfo {
    /// The services directory URL that answered
    pub url: String,

    /// Instance root (the services URL without `/rest/services`)
    pub base_url: String,

    /// Proxy needed to reach the host, if direct access was rejected
    pub proxy_url: Option<String>,

    pub authentication_info: AuthenticationInfo,
}

impl ServerInfo {
    pub fn new(
        url: impl Into<String>,
        proxy_url: Option<String>,
        authentication_info: AuthenticationInfo,
    ) -> Self {
        let url = crate::url::trim_url(&url.into());
        Self {
            base_url: crate::url::base_url(&url),
            url,
            proxy_url,
            authentication_info,
        }
    }
}
