//! Crawl coordination
//!
//! This module walks a catalog one level at a time:
//! - Resolving a connection string to a working services directory
//! - Fanning out probes for folders, services and group sublayers
//! - Applying the filter, cheaply where the resource type decides
//! - Joining each level in catalog order with failed children removed
//! - Propagating cancellation to every in-flight request

use crate::config::Config;
use crate::credentials::{CredentialStore, StaticCredentialStore};
use crate::crawler::LevelJoin;
use crate::descriptor::{
    catalog_children, classify_layer, field_children, service_children, sublayer_urls,
    DescriptorClient, ServerInfoCache,
};
use crate::fetch::{build_fetch_stack, FetchError, RawFetcher};
use crate::model::wire::Catalog;
use crate::model::{Filter, Resource, ResourceNode, ResourceType, ServerInfo};
use crate::url::{candidate_urls, classify_url, host_of, services_root, Classification};
use crate::{CatalogError, Result};
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Walks ArcGIS-style REST catalogs
///
/// Cloning is cheap; clones share the fetch stack, the cache and the
/// cancellation state.
#[derive(Clone)]
pub struct CatalogCrawler {
    client: DescriptorClient,
    cache: Arc<ServerInfoCache>,
    default_proxy: Option<String>,
    cancel: Arc<Mutex<CancellationToken>>,
}

impl CatalogCrawler {
    /// Creates a crawler from configuration
    ///
    /// Builds the HTTP fetch stack, the credential store from
    /// `[[credentials]]`, and uses the process-wide server cache.
    ///
    /// # Arguments
    ///
    /// * `config` - The loaded configuration
    ///
    /// # Returns
    ///
    /// * `Ok(CatalogCrawler)` - Ready to crawl
    /// * `Err(CatalogError)` - The HTTP client could not be built
    pub fn new(config: &Config) -> Result<Self> {
        let fetcher = build_fetch_stack(&config.client)?;
        let credentials = StaticCredentialStore::from_entries(&config.credentials);

        Ok(Self::with_fetcher(fetcher)
            .with_credentials(Arc::new(credentials), config.crawl.username.clone())
            .with_default_proxy(config.client.proxy_url.clone()))
    }

    /// Creates a crawler around an existing fetcher
    pub fn with_fetcher(fetcher: Arc<dyn RawFetcher>) -> Self {
        Self {
            client: DescriptorClient::new(fetcher),
            cache: ServerInfoCache::global(),
            default_proxy: None,
            cancel: Arc::new(Mutex::new(CancellationToken::new())),
        }
    }

    pub fn with_credentials(
        mut self,
        credentials: Arc<dyn CredentialStore>,
        username: Option<String>,
    ) -> Self {
        self.client = self.client.with_credentials(credentials, username);
        self
    }

    /// Uses a private cache instead of the process-wide one
    pub fn with_server_info_cache(mut self, cache: Arc<ServerInfoCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Proxy used when a call does not name one
    pub fn with_default_proxy(mut self, proxy_url: Option<String>) -> Self {
        self.default_proxy = proxy_url;
        self
    }

    pub fn server_info_cache(&self) -> &Arc<ServerInfoCache> {
        &self.cache
    }

    /// Cancels every in-flight operation
    ///
    /// Operations started afterwards run normally.
    pub fn cancel(&self) {
        let mut current = self.cancel.lock().unwrap_or_else(|e| e.into_inner());
        tracing::info!("Cancelling in-flight catalog requests");
        current.cancel();
        *current = CancellationToken::new();
    }

    fn token(&self) -> CancellationToken {
        self.cancel
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn fallback(&self, proxy: Option<&str>) -> Option<String> {
        proxy.map(str::to_string).or_else(|| self.default_proxy.clone())
    }

    /// Crawls the root level of a connection
    ///
    /// Bare hosts and services directory URLs are resolved through the
    /// candidate list; folder, service and layer URLs are crawled from that
    /// node directly.
    ///
    /// # Arguments
    ///
    /// * `connection` - Host name or REST URL, with or without scheme
    /// * `filter` - Inclusion flags for the level
    /// * `proxy` - Proxy page for hosts that reject direct requests
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<Resource>)` - The level in catalog order, failed and
    ///   filtered children removed
    /// * `Err(CatalogError::AllCandidatesExhausted)` - No candidate answered
    /// * `Err(CatalogError)` - The seed node itself failed or the crawl was
    ///   cancelled
    pub async fn crawl(
        &self,
        connection: &str,
        filter: Filter,
        proxy: Option<&str>,
    ) -> Result<Vec<Resource>> {
        let cancel = self.token();
        let fallback = self.fallback(proxy);
        let result = self.crawl_root(connection, filter, fallback, cancel.clone()).await;
        finish(result, &cancel)
    }

    /// Crawls in the background and reports through exactly one callback
    pub fn crawl_with_callbacks<C, E>(
        &self,
        connection: &str,
        filter: Filter,
        proxy: Option<&str>,
        on_completed: C,
        on_failed: E,
    ) -> JoinHandle<()>
    where
        C: FnOnce(Vec<Resource>) + Send + 'static,
        E: FnOnce(CatalogError) + Send + 'static,
    {
        let crawler = self.clone();
        let connection = connection.to_string();
        let proxy = proxy.map(str::to_string);

        tokio::spawn(async move {
            match crawler.crawl(&connection, filter, proxy.as_deref()).await {
                Ok(resources) => on_completed(resources),
                Err(e) => on_failed(e),
            }
        })
    }

    /// Lists one level below any resource
    pub async fn children(&self, resource: &Resource, filter: Filter) -> Result<Vec<Resource>> {
        let cancel = self.token();
        let result = self
            .level(resource.clone(), filter, self.default_proxy.clone(), cancel.clone())
            .await;
        finish(result, &cancel)
    }

    /// Crawls a connection and expands it `max_depth` levels further
    ///
    /// Nodes whose expansion fails are kept as leaves.
    pub async fn crawl_tree(
        &self,
        connection: &str,
        filter: Filter,
        proxy: Option<&str>,
        max_depth: u32,
    ) -> Result<Vec<ResourceNode>> {
        let cancel = self.token();
        let fallback = self.fallback(proxy);

        let roots = self
            .crawl_root(connection, filter, fallback.clone(), cancel.clone())
            .await;
        let roots = finish(roots, &cancel)?;

        let nodes = join_all(
            roots
                .into_iter()
                .map(|r| self.expand(r, filter, fallback.clone(), cancel.clone(), max_depth)),
        )
        .await;

        finish(Ok(nodes), &cancel)
    }

    /// Classifies a connection string into a single resource
    ///
    /// URLs that name a node are classified without network access. Bare
    /// hosts are resolved by probing the candidate list.
    pub async fn resolve(&self, connection: &str, proxy: Option<&str>) -> Result<Resource> {
        let classification = classify_url(connection);
        if classification.resource_type != ResourceType::Undefined
            && has_scheme(&classification.url)
        {
            return Ok(resource_from(&classification));
        }

        let info = self.get_server_info(connection, proxy).await?;
        let name = host_of(&info.url).unwrap_or_else(|| info.url.clone());
        Ok(Resource::new(info.url, name, ResourceType::Server).with_proxy(info.proxy_url))
    }

    /// Returns the resolved server behind a connection string
    ///
    /// Answers from the cache when a candidate already won; otherwise probes
    /// the candidates and caches the winner.
    pub async fn get_server_info(&self, connection: &str, proxy: Option<&str>) -> Result<ServerInfo> {
        let connection = server_connection(connection);
        let candidates = candidate_urls(&connection)?;
        if let Some(info) = self.cache.find_resolved(&candidates) {
            tracing::debug!("ServerInfo cache hit for {}", info.url);
            return Ok(info);
        }

        let cancel = self.token();
        let result = self
            .probe_candidates(&connection, &candidates, self.fallback(proxy), &cancel)
            .await
            .map(|(info, _)| info);
        finish(result, &cancel)
    }

    async fn crawl_root(
        &self,
        connection: &str,
        filter: Filter,
        fallback: Option<String>,
        cancel: CancellationToken,
    ) -> Result<Vec<Resource>> {
        let classification = classify_url(connection);

        match classification.resource_type {
            ResourceType::Server | ResourceType::Undefined => {
                let (info, catalog) = self
                    .resolve_server(connection, fallback.clone(), &cancel)
                    .await?;
                let children = catalog_children(&info.url, &catalog, info.proxy_url.as_deref());
                let level = self.catalog_level(children, filter, fallback, cancel).await;
                tracing::info!("{}: {} resources", info.url, level.len());
                Ok(level)
            }
            _ => {
                let seed = self
                    .seed_resource(&classification, fallback.clone(), &cancel)
                    .await?;
                tracing::info!("Crawling {} from {}", seed.resource_type, seed.url);
                self.level(seed, filter, fallback, cancel).await
            }
        }
    }

    /// Resolves the server, trying its cached winner before the candidates
    async fn resolve_server(
        &self,
        connection: &str,
        fallback: Option<String>,
        cancel: &CancellationToken,
    ) -> Result<(ServerInfo, Catalog)> {
        let connection = server_connection(connection);
        let candidates = candidate_urls(&connection)?;

        if let Some(info) = self.cache.find_resolved(&candidates) {
            let server = Resource::new(info.url.clone(), "", ResourceType::Server)
                .with_proxy(info.proxy_url.clone());
            match self
                .client
                .fetch_catalog(&server, fallback.as_deref(), cancel)
                .await
            {
                Ok(catalog) => return Ok((info, catalog.value)),
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => tracing::warn!("Cached server {} no longer answers: {}", info.url, e),
            }
        }

        self.probe_candidates(&connection, &candidates, fallback, cancel)
            .await
    }

    /// Tries candidates strictly in order; the first catalog wins
    async fn probe_candidates(
        &self,
        connection: &str,
        candidates: &[String],
        fallback: Option<String>,
        cancel: &CancellationToken,
    ) -> Result<(ServerInfo, Catalog)> {
        for candidate in candidates {
            if cancel.is_cancelled() {
                return Err(FetchError::Cancelled.into());
            }

            match self
                .client
                .probe_server(candidate, fallback.as_deref(), cancel)
                .await
            {
                Ok((info, catalog)) => {
                    tracing::info!("Resolved '{}' to {}", connection, info.url);
                    self.cache.insert(info.clone());
                    return Ok((info, catalog));
                }
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => tracing::debug!("Candidate {} failed: {}", candidate, e),
            }
        }

        Err(CatalogError::AllCandidatesExhausted {
            connection: connection.to_string(),
            attempted: candidates.len(),
        })
    }

    /// Builds the starting resource for a deep URL
    ///
    /// The containing server is resolved first so the node inherits its
    /// scheme and proxy. Layer URLs are probed to tell groups from leaves.
    async fn seed_resource(
        &self,
        classification: &Classification,
        fallback: Option<String>,
        cancel: &CancellationToken,
    ) -> Result<Resource> {
        let mut seed = resource_from(classification);

        let root = services_root(&classification.url);
        if root.len() < classification.url.len() {
            let suffix = &classification.url[root.len()..];
            let (info, _) = self.resolve_server(&root, fallback.clone(), cancel).await?;
            seed.url = format!("{}{}", info.url, suffix);
            seed.proxy_url = info.proxy_url;
        }

        if seed.resource_type == ResourceType::Layer {
            let details = self
                .client
                .fetch_layer_details(&seed, fallback.as_deref(), cancel)
                .await?;
            let proxy = details.proxy_url.clone().or(seed.proxy_url.clone());
            seed = classify_layer(&seed.url, &details.value, proxy).resource;
        }

        Ok(seed)
    }

    /// Computes the children of one resource
    fn level(
        &self,
        resource: Resource,
        filter: Filter,
        fallback: Option<String>,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, Result<Vec<Resource>>> {
        let crawler = self.clone();
        async move {
            let fb = fallback.as_deref();
            let children = match resource.resource_type {
                ResourceType::Server | ResourceType::Folder => {
                    let catalog = crawler.client.fetch_catalog(&resource, fb, &cancel).await?;
                    let proxy = catalog.proxy_url.or(resource.proxy_url.clone());
                    let children =
                        catalog_children(&resource.url, &catalog.value, proxy.as_deref());
                    crawler
                        .catalog_level(children, filter, fallback.clone(), cancel.clone())
                        .await
                }
                ResourceType::MapServer | ResourceType::FeatureServer => {
                    let info = crawler
                        .client
                        .fetch_service_info(&resource, fb, &cancel)
                        .await?;
                    let proxy = info.proxy_url.clone().or(resource.proxy_url.clone());
                    let service = resource.clone().with_proxy(proxy);
                    service_children(&service, &info.value)
                        .into_iter()
                        .filter(|c| filter.admits_layer(c.resource.resource_type, c.is_spatial))
                        .map(|c| c.resource)
                        .collect()
                }
                ResourceType::GroupLayer => {
                    crawler
                        .group_level(&resource, filter, fallback.clone(), cancel.clone())
                        .await?
                }
                ResourceType::Layer | ResourceType::EditableLayer => {
                    let details = crawler
                        .client
                        .fetch_layer_details(&resource, fb, &cancel)
                        .await?;
                    let proxy = details.proxy_url.clone().or(resource.proxy_url.clone());
                    field_children(&resource.clone().with_proxy(proxy), &details.value)
                }
                ResourceType::ImageServer
                | ResourceType::GPServer
                | ResourceType::Field
                | ResourceType::Undefined => Vec::new(),
            };

            if cancel.is_cancelled() {
                return Err(FetchError::Cancelled.into());
            }
            tracing::debug!("{} {}: {} children", resource.resource_type, resource.url, children.len());
            Ok(children)
        }
        .boxed()
    }

    /// Validates the folders and services of a catalog
    ///
    /// Folders are always probed. Services rejected by type never are;
    /// services the type alone cannot decide are probed for their info.
    async fn catalog_level(
        &self,
        children: Vec<Resource>,
        filter: Filter,
        fallback: Option<String>,
        cancel: CancellationToken,
    ) -> Vec<Resource> {
        let join = LevelJoin::new();

        for child in children {
            let resource_type = child.resource_type;

            if resource_type == ResourceType::Folder {
                let slot = join.reserve();
                let crawler = self.clone();
                let (fallback, cancel) = (fallback.clone(), cancel.clone());
                tokio::spawn(async move {
                    if let Some(folder) = crawler.validate_folder(child, filter, fallback, cancel).await {
                        slot.fill(folder);
                    }
                });
            } else if !filter.admits_service_type(resource_type) {
                tracing::trace!("Filtered out {}", child.url);
            } else if filter.needs_service_info(resource_type) {
                let slot = join.reserve();
                let crawler = self.clone();
                let (fallback, cancel) = (fallback.clone(), cancel.clone());
                tokio::spawn(async move {
                    match crawler
                        .client
                        .fetch_service_info(&child, fallback.as_deref(), &cancel)
                        .await
                    {
                        Ok(info) if filter.admits_service(resource_type, &info.value) => {
                            let proxy = info.proxy_url.or(child.proxy_url.clone());
                            slot.fill(child.with_proxy(proxy));
                        }
                        Ok(_) => tracing::trace!("Filtered out {}", child.url),
                        Err(e) => tracing::warn!("Dropping {}: {}", child.url, e),
                    }
                });
            } else {
                join.push_ready(child);
            }
        }

        join.seal().await
    }

    /// Probes a folder; with a filter set, keeps it only if something inside passes
    async fn validate_folder(
        &self,
        folder: Resource,
        filter: Filter,
        fallback: Option<String>,
        cancel: CancellationToken,
    ) -> Option<Resource> {
        if filter.is_empty() {
            return match self
                .client
                .fetch_catalog(&folder, fallback.as_deref(), &cancel)
                .await
            {
                Ok(catalog) => {
                    let proxy = catalog.proxy_url.or(folder.proxy_url.clone());
                    Some(folder.with_proxy(proxy))
                }
                Err(e) => {
                    tracing::warn!("Dropping folder {}: {}", folder.url, e);
                    None
                }
            };
        }

        match self.level(folder.clone(), filter, fallback, cancel).await {
            Ok(contents) if !contents.is_empty() => Some(folder),
            Ok(_) => {
                tracing::trace!("Folder {} has nothing matching the filter", folder.url);
                None
            }
            Err(e) => {
                tracing::warn!("Dropping folder {}: {}", folder.url, e);
                None
            }
        }
    }

    /// Probes each sublayer of a group to classify it
    async fn group_level(
        &self,
        group: &Resource,
        filter: Filter,
        fallback: Option<String>,
        cancel: CancellationToken,
    ) -> Result<Vec<Resource>> {
        let details = self
            .client
            .fetch_layer_details(group, fallback.as_deref(), &cancel)
            .await?;
        let proxy = details.proxy_url.clone().or(group.proxy_url.clone());

        let join = LevelJoin::new();
        for url in sublayer_urls(group, &details.value) {
            let slot = join.reserve();
            let crawler = self.clone();
            let sublayer = Resource::new(url, "", ResourceType::Layer).with_proxy(proxy.clone());
            let (fallback, cancel) = (fallback.clone(), cancel.clone());

            tokio::spawn(async move {
                match crawler
                    .client
                    .fetch_layer_details(&sublayer, fallback.as_deref(), &cancel)
                    .await
                {
                    Ok(details) => {
                        let proxy = details.proxy_url.clone().or(sublayer.proxy_url.clone());
                        let child = classify_layer(&sublayer.url, &details.value, proxy);
                        if filter.admits_layer(child.resource.resource_type, child.is_spatial) {
                            slot.fill(child.resource);
                        }
                    }
                    Err(e) => tracing::warn!("Dropping sublayer {}: {}", sublayer.url, e),
                }
            });
        }

        Ok(join.seal().await)
    }

    fn expand(
        &self,
        resource: Resource,
        filter: Filter,
        fallback: Option<String>,
        cancel: CancellationToken,
        depth: u32,
    ) -> BoxFuture<'static, ResourceNode> {
        let crawler = self.clone();
        async move {
            if depth == 0 || !resource.resource_type.is_container() {
                return ResourceNode::leaf(resource);
            }

            match crawler
                .level(resource.clone(), filter, fallback.clone(), cancel.clone())
                .await
            {
                Ok(children) => {
                    let children = join_all(children.into_iter().map(|child| {
                        crawler.expand(child, filter, fallback.clone(), cancel.clone(), depth - 1)
                    }))
                    .await;
                    ResourceNode { resource, children }
                }
                Err(e) => {
                    if !e.is_cancelled() {
                        tracing::warn!("Could not expand {}: {}", resource.url, e);
                    }
                    ResourceNode::leaf(resource)
                }
            }
        }
        .boxed()
    }
}

/// Turns late results into a cancellation error once the token fired
fn finish<T>(result: Result<T>, cancel: &CancellationToken) -> Result<T> {
    if cancel.is_cancelled() {
        return Err(FetchError::Cancelled.into());
    }
    result
}

/// Reduces deep URLs to their services directory for server resolution
fn server_connection(connection: &str) -> String {
    let classification = classify_url(connection);
    match classification.resource_type {
        ResourceType::Undefined => connection.trim().to_string(),
        _ => services_root(&classification.url),
    }
}

fn has_scheme(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn resource_from(classification: &Classification) -> Resource {
    let resource = Resource::new(
        classification.url.clone(),
        classification.display_name(),
        classification.resource_type,
    );
    match &classification.tag {
        Some(tag) => resource.with_tag(tag.clone()),
        None => resource,
    }
}
