//! Catalog-Ripple: an ArcGIS REST catalog mapper
//!
//! This crate discovers the REST catalog of a geospatial service host from a
//! loosely typed connection string and walks it as a tree of folders,
//! services, layers and fields. Requests go through an authentication gate
//! and fall back to a proxy when the host rejects direct access.

pub mod config;
pub mod crawler;
pub mod credentials;
pub mod descriptor;
pub mod fetch;
pub mod model;
pub mod output;
pub mod url;

use thiserror::Error;

/// Main error type for Catalog-Ripple operations
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Network, security and cancellation failures from the fetch stack
    #[error(transparent)]
    Fetch(#[from] fetch::FetchError),

    #[error("Empty response from {url}")]
    EmptyResponse { url: String },

    #[error("Server reported an error for {url}: {message} (code {code:?})")]
    ServerReported {
        url: String,
        message: String,
        code: Option<i64>,
    },

    #[error("Failed to deserialize response from {url}: {message}")]
    Deserialization { url: String, message: String },

    #[error("No REST endpoint answered for '{connection}' ({attempted} candidates tried)")]
    AllCandidatesExhausted { connection: String, attempted: usize },

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CatalogError {
    /// Returns true if the operation was abandoned because of a cancel request
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Fetch(fetch::FetchError::Cancelled))
    }

    /// Returns true if the failure came from a security rejection
    pub fn is_security(&self) -> bool {
        matches!(self, Self::Fetch(fetch::FetchError::Security { .. }))
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid host pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Empty connection string")]
    EmptyConnection,
}

/// Result type alias for Catalog-Ripple operations
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::CatalogCrawler;
pub use model::{Filter, Resource, ResourceNode, ResourceType, ServerInfo};
pub use url::{candidate_urls, classify_url, Classification};
