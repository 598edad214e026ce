use crate::descriptor::{Descriptor, DescriptorClient};
use crate::fetch::Route;
use crate::model::wire::{Catalog, InstanceInfo};
use crate::model::{AuthenticationInfo, Resource, ResourceType, ServerInfo};
use crate::url::{info_url, join_segment, last_segment, services_root};
use crate::Result;
use tokio_util::sync::CancellationToken;

impl DescriptorClient {
    /// Fetches the catalog of a services directory or folder
    pub async fn fetch_catalog(
        &self,
        resource: &Resource,
        fallback_proxy: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Descriptor<Catalog>> {
        self.describe(resource, fallback_proxy, cancel).await
    }

    /// Probes a candidate services directory URL
    ///
    /// Succeeds when the URL answers with a catalog. The instance metadata is
    /// fetched afterwards through the same route; its failure only means the
    /// server is assumed not to support tokens.
    pub async fn probe_server(
        &self,
        candidate: &str,
        fallback_proxy: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<(ServerInfo, Catalog)> {
        let catalog: Descriptor<Catalog> = self
            .get_json(candidate, Route::Direct { fallback: fallback_proxy }, cancel)
            .await?;

        let route = Route::for_resource(catalog.proxy_url.as_deref(), fallback_proxy);
        let auth = self.fetch_instance_info(candidate, route, cancel).await;

        Ok((
            ServerInfo::new(candidate, catalog.proxy_url, auth),
            catalog.value,
        ))
    }

    /// Reads token support from `{instance}/rest/info`
    pub async fn fetch_instance_info(
        &self,
        services_url: &str,
        route: Route<'_>,
        cancel: &CancellationToken,
    ) -> AuthenticationInfo {
        let url = info_url(services_url);
        match self.get_json::<InstanceInfo>(&url, route, cancel).await {
            Ok(info) => info
                .value
                .auth_info
                .map(|auth| AuthenticationInfo {
                    supports_token_authentication: auth.is_token_based_security,
                    token_services_url: auth.token_services_url,
                })
                .unwrap_or_default(),
            Err(e) => {
                tracing::debug!("No instance info at {}: {}", url, e);
                AuthenticationInfo::default()
            }
        }
    }
}

/// Maps a catalog into folder and service resources, in catalog order
///
/// Folders come first, then services. Service names carry their folder
/// prefix, so both are resolved against the services directory root rather
/// than `catalog_url`. Service types this crate does not browse are skipped.
pub fn catalog_children(
    catalog_url: &str,
    catalog: &Catalog,
    proxy_url: Option<&str>,
) -> Vec<Resource> {
    let root = services_root(catalog_url);
    let proxy = proxy_url.map(str::to_string);

    let folders = catalog.folders.iter().map(|folder| {
        let url = join_segment(&root, folder);
        let name = last_segment(&url).unwrap_or(folder.as_str()).to_string();
        Resource::new(url, name, ResourceType::Folder).with_proxy(proxy.clone())
    });

    let services = catalog.services.iter().filter_map(|service| {
        let resource_type = ResourceType::from_service_type(&service.service_type);
        if resource_type == ResourceType::Undefined {
            tracing::trace!(
                "Skipping {} ({})",
                service.name,
                service.service_type
            );
            return None;
        }
        let url = join_segment(&root, &format!("{}/{}", service.name, service.service_type));
        let name = service
            .name
            .rsplit('/')
            .next()
            .unwrap_or(service.name.as_str())
            .to_string();
        Some(Resource::new(url, name, resource_type).with_proxy(proxy.clone()))
    });

    folders.chain(services).collect()
}
