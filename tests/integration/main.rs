//! Integration tests for Catalog-Ripple
//!
//! Mock catalogs are served by wiremock, except where a test needs control
//! over host names and schemes; those use an in-memory fetcher.

mod crawl_tests;
mod resolution_tests;

use std::sync::Arc;

use catalog_ripple::config::Config;
use catalog_ripple::descriptor::ServerInfoCache;
use catalog_ripple::CatalogCrawler;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mounts a JSON body at a path
pub async fn mount_json(server: &MockServer, at: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Mounts a bare status response at a path
pub async fn mount_status(server: &MockServer, at: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// A crawler with a real HTTP stack and a private server cache
pub fn http_crawler(config: &Config) -> CatalogCrawler {
    CatalogCrawler::new(config)
        .expect("Failed to build crawler")
        .with_server_info_cache(Arc::new(ServerInfoCache::new()))
}
