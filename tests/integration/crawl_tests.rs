//! End-to-end crawls against wiremock catalogs

use std::time::Duration;

use catalog_ripple::config::{parse_config, Config};
use catalog_ripple::output::{format_markdown, format_tree, CatalogReport};
use catalog_ripple::{Filter, ResourceType};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::{http_crawler, mount_json, mount_status};

const SERVICES: &str = "/arcgis/rest/services";

fn names(resources: &[catalog_ripple::Resource]) -> Vec<&str> {
    resources.iter().map(|r| r.display_name.as_str()).collect()
}

#[tokio::test]
async fn test_cached_filter_drops_failed_service_probe() {
    let server = MockServer::start().await;
    let root = format!("{}{}", server.uri(), SERVICES);

    mount_json(
        &server,
        SERVICES,
        r#"{"folders": ["Basemaps", "Utilities", "Transit"],
            "services": [
                {"name": "Roads", "type": "MapServer"},
                {"name": "Broken", "type": "MapServer"}
            ]}"#,
    )
    .await;

    // Each folder holds one cached service so it survives the filter
    for folder in ["Basemaps", "Utilities", "Transit"] {
        mount_json(
            &server,
            &format!("{}/{}", SERVICES, folder),
            &format!(
                r#"{{"services": [{{"name": "{}/Tiles", "type": "MapServer"}}]}}"#,
                folder
            ),
        )
        .await;
        mount_json(
            &server,
            &format!("{}/{}/Tiles/MapServer", SERVICES, folder),
            r#"{"singleFusedMapCache": true}"#,
        )
        .await;
    }

    mount_json(
        &server,
        &format!("{}/Roads/MapServer", SERVICES),
        r#"{"singleFusedMapCache": true, "layers": []}"#,
    )
    .await;
    mount_status(&server, &format!("{}/Broken/MapServer", SERVICES), 500).await;

    let crawler = http_crawler(&Config::default());
    let level = crawler
        .crawl(&root, Filter::CACHED_SERVICES, None)
        .await
        .expect("Crawl failed");

    assert_eq!(names(&level), vec!["Basemaps", "Utilities", "Transit", "Roads"]);
    assert_eq!(level[0].resource_type, ResourceType::Folder);
    assert_eq!(level[0].url, format!("{}/Basemaps", root));
    assert_eq!(level[3].url, format!("{}/Roads/MapServer", root));
}

#[tokio::test]
async fn test_folder_without_matches_is_dropped() {
    let server = MockServer::start().await;
    let root = format!("{}{}", server.uri(), SERVICES);

    mount_json(&server, SERVICES, r#"{"folders": ["Imagery", "Tools"]}"#).await;
    mount_json(
        &server,
        &format!("{}/Imagery", SERVICES),
        r#"{"services": [{"name": "Imagery/Ortho", "type": "ImageServer"}]}"#,
    )
    .await;
    mount_json(
        &server,
        &format!("{}/Tools", SERVICES),
        r#"{"services": [{"name": "Tools/Buffer", "type": "GPServer"}]}"#,
    )
    .await;

    let crawler = http_crawler(&Config::default());
    let level = crawler
        .crawl(&root, Filter::IMAGE_SERVICES, None)
        .await
        .unwrap();

    assert_eq!(names(&level), vec!["Imagery"]);
}

#[tokio::test]
async fn test_crawl_tree_reaches_fields() {
    let server = MockServer::start().await;
    let root = format!("{}{}", server.uri(), SERVICES);

    mount_json(
        &server,
        SERVICES,
        r#"{"services": [{"name": "Transit", "type": "MapServer"}]}"#,
    )
    .await;
    mount_json(
        &server,
        &format!("{}/Transit/MapServer", SERVICES),
        r#"{"layers": [{"id": 0, "name": "Stops", "geometryType": "esriGeometryPoint"}],
            "tables": [{"id": 1, "name": "Schedule"}]}"#,
    )
    .await;
    mount_json(
        &server,
        &format!("{}/Transit/MapServer/0", SERVICES),
        r#"{"id": 0, "name": "Stops", "geometryType": "esriGeometryPoint",
            "fields": [{"name": "OBJECTID"}, {"name": "STOP_NAME", "alias": "Stop name"}]}"#,
    )
    .await;
    mount_json(
        &server,
        &format!("{}/Transit/MapServer/1", SERVICES),
        r#"{"id": 1, "name": "Schedule", "fields": [{"name": "DEPARTS"}]}"#,
    )
    .await;

    let crawler = http_crawler(&Config::default());
    let tree = crawler
        .crawl_tree(&root, Filter::empty(), None, 2)
        .await
        .unwrap();

    assert_eq!(tree.len(), 1);
    let service = &tree[0];
    assert_eq!(service.resource.resource_type, ResourceType::MapServer);
    assert_eq!(service.count(), 6);

    let layers: Vec<&str> = service
        .children
        .iter()
        .map(|n| n.resource.display_name.as_str())
        .collect();
    assert_eq!(layers, vec!["Stops", "Schedule"]);

    let fields: Vec<&str> = service.children[0]
        .children
        .iter()
        .map(|n| n.resource.display_name.as_str())
        .collect();
    assert_eq!(fields, vec!["OBJECTID", "Stop name"]);

    let report = CatalogReport::new(root.clone(), Filter::empty(), tree);
    assert_eq!(report.count_of(ResourceType::Field), 3);
    assert!(format_tree(&report.nodes).contains("    Stop name [Field] #STOP_NAME"));
    assert!(format_markdown(&report).contains("## Catalog"));
}

#[tokio::test]
async fn test_spatial_filter_drops_tables() {
    let server = MockServer::start().await;
    let service = format!("{}{}/Transit/FeatureServer", server.uri(), SERVICES);

    mount_json(&server, SERVICES, r#"{"services": []}"#).await;
    mount_json(
        &server,
        &format!("{}/Transit/FeatureServer", SERVICES),
        r#"{"layers": [{"id": 0, "name": "Stops", "geometryType": "esriGeometryPoint"}],
            "tables": [{"id": 1, "name": "Schedule"}]}"#,
    )
    .await;

    let crawler = http_crawler(&Config::default());
    let level = crawler
        .crawl(&service, Filter::SPATIAL_LAYERS, None)
        .await
        .unwrap();

    assert_eq!(names(&level), vec!["Stops"]);
    assert_eq!(level[0].tag.as_deref(), Some("0"));
}

#[tokio::test]
async fn test_rejected_host_is_crawled_through_proxy() {
    let server = MockServer::start().await;
    let root = format!("{}{}", server.uri(), SERVICES);
    let proxy = format!("{}/proxy", server.uri());

    // Direct access is refused; the proxy page answers every request
    mount_status(&server, SERVICES, 403).await;
    mount_json(
        &server,
        "/proxy",
        r#"{"folders": ["Public"], "services": [{"name": "Roads", "type": "MapServer"}]}"#,
    )
    .await;

    let crawler = http_crawler(&Config::default());
    let level = crawler.crawl(&root, Filter::empty(), Some(&proxy)).await.unwrap();

    assert_eq!(names(&level), vec!["Public", "Roads"]);
    assert!(level
        .iter()
        .all(|r| r.proxy_url.as_deref() == Some(proxy.as_str())));

    let info = crawler.get_server_info(&root, Some(&proxy)).await.unwrap();
    assert_eq!(info.proxy_url.as_deref(), Some(proxy.as_str()));
}

#[tokio::test]
async fn test_rejected_host_without_proxy_fails() {
    let server = MockServer::start().await;
    let root = format!("{}{}", server.uri(), SERVICES);
    mount_status(&server, SERVICES, 401).await;

    let crawler = http_crawler(&Config::default());
    let error = crawler.crawl(&root, Filter::empty(), None).await.unwrap_err();

    assert!(matches!(
        error,
        catalog_ripple::CatalogError::AllCandidatesExhausted { attempted: 1, .. }
    ));
}

#[tokio::test]
async fn test_cancel_interrupts_crawl() {
    let server = MockServer::start().await;
    let root = format!("{}{}", server.uri(), SERVICES);

    Mock::given(method("GET"))
        .and(path(SERVICES))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"services": []}"#)
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let crawler = http_crawler(&Config::default());
    let background = crawler.clone();
    let handle =
        tokio::spawn(async move { background.crawl(&root, Filter::empty(), None).await });

    tokio::time::sleep(Duration::from_millis(200)).await;
    crawler.cancel();

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("Crawl did not stop after cancel")
        .unwrap();
    assert!(result.unwrap_err().is_cancelled());
}

#[tokio::test]
async fn test_configured_token_is_sent() {
    let server = MockServer::start().await;
    let root = format!("{}{}", server.uri(), SERVICES);

    Mock::given(method("GET"))
        .and(path(SERVICES))
        .and(query_param("token", "s3cret"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"services": [{"name": "Private", "type": "FeatureServer"}]}"#),
        )
        .mount(&server)
        .await;
    mount_status(&server, SERVICES, 403).await;

    let config = parse_config(
        r#"
[client]
auth-probe = false

[[credentials]]
host = "127.0.0.1"
token = "s3cret"
"#,
    )
    .unwrap();

    let crawler = http_crawler(&config);
    let level = crawler.crawl(&root, Filter::empty(), None).await.unwrap();
    assert_eq!(names(&level), vec!["Private"]);
}

#[tokio::test]
async fn test_crawl_with_callbacks_reports_once() {
    let server = MockServer::start().await;
    let root = format!("{}{}", server.uri(), SERVICES);
    mount_json(
        &server,
        SERVICES,
        r#"{"services": [{"name": "Roads", "type": "MapServer"}]}"#,
    )
    .await;

    let crawler = http_crawler(&Config::default());
    let (tx, rx) = tokio::sync::oneshot::channel();
    let failed = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
    let failed_flag = failed.clone();

    crawler
        .crawl_with_callbacks(
            &root,
            Filter::empty(),
            None,
            move |resources| {
                let _ = tx.send(resources.len());
            },
            move |_| failed_flag.store(true, std::sync::atomic::Ordering::SeqCst),
        )
        .await
        .unwrap();

    assert_eq!(rx.await.unwrap(), 1);
    assert!(!failed.load(std::sync::atomic::Ordering::SeqCst));
}
