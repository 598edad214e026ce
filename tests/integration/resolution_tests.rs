//! Server resolution from bare host names

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use catalog_ripple::descriptor::ServerInfoCache;
use catalog_ripple::fetch::{FetchError, FetchRequest, RawFetcher};
use catalog_ripple::{CatalogCrawler, Filter, ResourceType};

/// Refuses plain http outright and serves a fixed table over https
struct HttpsOnlyHost {
    bodies: HashMap<String, String>,
    seen: Mutex<Vec<String>>,
}

impl HttpsOnlyHost {
    fn new(bodies: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            bodies: bodies
                .iter()
                .map(|(url, body)| (url.to_string(), body.to_string()))
                .collect(),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl RawFetcher for HttpsOnlyHost {
    async fn fetch(&self, request: &FetchRequest) -> Result<String, FetchError> {
        let full = request.full_url();
        self.seen.lock().unwrap().push(full.clone());

        if request.url.starts_with("http://") {
            return Err(FetchError::Network {
                url: full,
                message: "connection refused".to_string(),
                status: None,
            });
        }
        self.bodies
            .get(catalog_ripple::url::strip_query(&request.url))
            .cloned()
            .ok_or(FetchError::Network {
                url: full,
                message: "HTTP 404".to_string(),
                status: Some(404),
            })
    }
}

const SERVICES: &str = "https://arcgis.example.com/arcgis/rest/services";

fn crawler(host: Arc<HttpsOnlyHost>) -> CatalogCrawler {
    CatalogCrawler::with_fetcher(host).with_server_info_cache(Arc::new(ServerInfoCache::new()))
}

#[tokio::test]
async fn test_bare_host_resolves_to_first_answering_candidate() {
    let host = HttpsOnlyHost::new(&[
        (
            SERVICES,
            r#"{"folders": ["Utilities"], "services": [{"name": "Parcels", "type": "MapServer"}]}"#,
        ),
        (&format!("{}/Utilities", SERVICES), r#"{"services": []}"#),
        (
            "https://arcgis.example.com/arcgis/rest/info",
            r#"{"authInfo": {"isTokenBasedSecurity": true,
                "tokenServicesUrl": "https://arcgis.example.com/arcgis/tokens/"}}"#,
        ),
    ]);
    let crawler = crawler(host.clone());

    let level = crawler
        .crawl("arcgis.example.com", Filter::empty(), None)
        .await
        .unwrap();

    let names: Vec<&str> = level.iter().map(|r| r.display_name.as_str()).collect();
    assert_eq!(names, vec!["Utilities", "Parcels"]);

    // All four http guesses fail before the https full path is tried
    let calls = host.calls();
    assert!(calls[..4].iter().all(|c| c.starts_with("http://")));
    assert_eq!(calls[4], format!("{}?f=json", SERVICES));

    let info = crawler
        .server_info_cache()
        .get("https://arcgis.example.com/arcgis")
        .expect("Winner was not cached");
    assert_eq!(info.url, SERVICES);
    assert!(info.authentication_info.supports_token_authentication);
    assert_eq!(
        info.authentication_info.token_services_url.as_deref(),
        Some("https://arcgis.example.com/arcgis/tokens/")
    );
}

#[tokio::test]
async fn test_server_info_answers_from_cache() {
    let host = HttpsOnlyHost::new(&[(SERVICES, r#"{"services": []}"#)]);
    let crawler = crawler(host.clone());

    let first = crawler
        .get_server_info("arcgis.example.com", None)
        .await
        .unwrap();
    let probes = host.calls().len();

    let second = crawler
        .get_server_info("arcgis.example.com", None)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert!(!first.authentication_info.supports_token_authentication);
    assert_eq!(host.calls().len(), probes);
}

#[tokio::test]
async fn test_resolve_bare_host_returns_server() {
    let host = HttpsOnlyHost::new(&[(SERVICES, r#"{"services": []}"#)]);
    let crawler = crawler(host);

    let server = crawler.resolve("arcgis.example.com", None).await.unwrap();

    assert_eq!(server.resource_type, ResourceType::Server);
    assert_eq!(server.url, SERVICES);
    assert_eq!(server.display_name, "arcgis.example.com");
}

#[tokio::test]
async fn test_deep_url_without_scheme_inherits_resolved_scheme() {
    let host = HttpsOnlyHost::new(&[
        (SERVICES, r#"{"services": [{"name": "Parcels", "type": "MapServer"}]}"#),
        (
            &format!("{}/Parcels/MapServer", SERVICES),
            r#"{"layers": [{"id": 0, "name": "Lots", "geometryType": "esriGeometryPolygon"}]}"#,
        ),
    ]);
    let crawler = crawler(host);

    let layers = crawler
        .crawl(
            "arcgis.example.com/arcgis/rest/services/Parcels/MapServer",
            Filter::empty(),
            None,
        )
        .await
        .unwrap();

    assert_eq!(layers.len(), 1);
    assert_eq!(layers[0].url, format!("{}/Parcels/MapServer/0", SERVICES));
}
