use crate::descriptor::{Descriptor, DescriptorClient, LayerChild};
use crate::model::wire::LayerDetails;
use crate::model::{Resource, ResourceType};
use crate::url::{classify_url, join_segment};
use crate::Result;
use tokio_util::sync::CancellationToken;

impl DescriptorClient {
    /// Fetches the details of a layer, table or group layer
    pub async fn fetch_layer_details(
        &self,
        resource: &Resource,
        fallback_proxy: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Descriptor<LayerDetails>> {
        self.describe(resource, fallback_proxy, cancel).await
    }
}

/// URLs of a group layer's sublayers, in the group's order
///
/// Sublayers are siblings of the group under the same service root.
pub fn sublayer_urls(group: &Resource, details: &LayerDetails) -> Vec<String> {
    let service_url = classify_url(&group.url)
        .parent_url
        .unwrap_or_else(|| group.url.clone());

    details
        .sub_layers
        .iter()
        .map(|sub| join_segment(&service_url, &sub.id.to_string()))
        .collect()
}

/// Classifies a probed layer
///
/// Groups stay groups whatever their capabilities. Layers of feature
/// services that allow editing become [`ResourceType::EditableLayer`].
pub fn classify_layer(url: &str, details: &LayerDetails, proxy_url: Option<String>) -> LayerChild {
    let in_feature_service = classify_url(url)
        .parent_url
        .map(|parent| classify_url(&parent).resource_type == ResourceType::FeatureServer)
        .unwrap_or(false);

    let resource_type = if details.is_group() {
        ResourceType::GroupLayer
    } else if in_feature_service && details.is_editable() {
        ResourceType::EditableLayer
    } else {
        ResourceType::Layer
    };

    LayerChild {
        resource: Resource::new(url, details.name.clone(), resource_type)
            .with_proxy(proxy_url)
            .with_tag(details.id.to_string()),
        is_spatial: Some(details.is_spatial()),
    }
}

/// Maps a layer's fields into [`ResourceType::Field`] resources
///
/// Fields share the layer's URL and carry the field name in `tag`.
pub fn field_children(layer: &Resource, details: &LayerDetails) -> Vec<Resource> {
    details
        .fields
        .iter()
        .map(|field| {
            let display = field
                .alias
                .as_deref()
                .filter(|alias| !alias.trim().is_empty())
                .unwrap_or(field.name.as_str());
            Resource::new(layer.url.clone(), display, ResourceType::Field)
                .with_proxy(layer.proxy_url.clone())
                .with_tag(field.name.clone())
        })
        .collect()
}
