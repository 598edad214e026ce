use crate::descriptor::{Descriptor, DescriptorClient, LayerChild};
use crate::model::wire::{LayerEntry, ServiceInfo};
use crate::model::{Resource, ResourceType};
use crate::url::join_segment;
use crate::Result;
use tokio_util::sync::CancellationToken;

impl DescriptorClient {
    /// Fetches the description of a service root
    pub async fn fetch_service_info(
        &self,
        resource: &Resource,
        fallback_proxy: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Descriptor<ServiceInfo>> {
        self.describe(resource, fallback_proxy, cancel).await
    }
}

/// Maps a service description into its top-level layers and tables
///
/// Layers nested under a group are reached through the group. Map and
/// feature services list layers; image and geoprocessing services have no
/// layer children.
pub fn service_children(service: &Resource, info: &ServiceInfo) -> Vec<LayerChild> {
    if !matches!(
        service.resource_type,
        ResourceType::MapServer | ResourceType::FeatureServer
    ) {
        return Vec::new();
    }

    let editable =
        service.resource_type == ResourceType::FeatureServer && info.is_editable();

    let layers = info
        .layers
        .iter()
        .filter(|entry| entry.is_top_level())
        .map(|entry| {
            let resource_type = if entry.is_group() {
                ResourceType::GroupLayer
            } else if editable {
                ResourceType::EditableLayer
            } else {
                ResourceType::Layer
            };
            LayerChild {
                resource: layer_resource(service, entry, resource_type),
                is_spatial: entry.geometry_type.as_ref().map(|_| true),
            }
        });

    let tables = info.tables.iter().map(|entry| LayerChild {
        resource: layer_resource(
            service,
            entry,
            if editable {
                ResourceType::EditableLayer
            } else {
                ResourceType::Layer
            },
        ),
        is_spatial: Some(false),
    });

    layers.chain(tables).collect()
}

fn layer_resource(service: &Resource, entry: &LayerEntry, resource_type: ResourceType) -> Resource {
    let id = entry.id.to_string();
    Resource::new(join_segment(&service.url, &id), entry.name.clone(), resource_type)
        .with_proxy(service.proxy_url.clone())
        .with_tag(id)
}
