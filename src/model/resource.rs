use serde::Serialize;
use std::fmt;

/// Kind of catalog node a [`Resource`] represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ResourceType {
    Server,
    Folder,
    MapServer,
    FeatureServer,
    ImageServer,
    GPServer,
    Layer,
    EditableLayer,
    GroupLayer,
    Field,
    Undefined,
}

impl ResourceType {
    /// Maps a catalog `type` string to a resource type
    ///
    /// Service types this crate does not browse (GeometryServer,
    /// GeocodeServer, ...) map to `Undefined`.
    pub fn from_service_type(service_type: &str) -> Self {
        match service_type.to_ascii_lowercase().as_str() {
            "mapserver" => Self::MapServer,
            "featureserver" => Self::FeatureServer,
            "imageserver" => Self::ImageServer,
            "gpserver" => Self::GPServer,
            _ => Self::Undefined,
        }
    }

    /// Returns true for service roots
    pub fn is_service(&self) -> bool {
        matches!(
            self,
            Self::MapServer | Self::FeatureServer | Self::ImageServer | Self::GPServer
        )
    }

    /// Returns true for layer-like nodes
    pub fn is_layer(&self) -> bool {
        matches!(self, Self::Layer | Self::EditableLayer | Self::GroupLayer)
    }

    /// Returns true if the node can have children
    pub fn is_container(&self) -> bool {
        !matches!(self, Self::Field | Self::Undefined)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Server => "Server",
            Self::Folder => "Folder",
            Self::MapServer => "MapServer",
            Self::FeatureServer => "FeatureServer",
            Self::ImageServer => "ImageServer",
            Self::GPServer => "GPServer",
            Self::Layer => "Layer",
            Self::EditableLayer => "EditableLayer",
            Self::GroupLayer => "GroupLayer",
            Self::Field => "Field",
            Self::Undefined => "Undefined",
        };
        write!(f, "{}", s)
    }
}

/// A discoverable catalog node
///
/// Identity is `url` + `resource_type` (see [`Resource::same_node`]). Fields
/// share their layer's URL and carry the field name in `tag`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    /// REST URL of the node
    pub url: String,

    /// Name shown to users
    pub display_name: String,

    /// Kind of node
    pub resource_type: ResourceType,

    /// Proxy needed to reach the node, if the host rejected direct access
    pub proxy_url: Option<String>,

    /// Opaque sub-id (layer id, tool id, field name)
    pub tag: Option<String>,
}

impl Resource {
    /// Creates a resource without proxy or tag
    pub fn new(
        url: impl Into<String>,
        display_name: impl Into<String>,
        resource_type: ResourceType,
    ) -> Self {
        Self {
            url: url.into(),
            display_name: display_name.into(),
            resource_type,
            proxy_url: None,
            tag: None,
        }
    }

    pub fn with_proxy(mut self, proxy_url: Option<String>) -> Self {
        self.proxy_url = proxy_url;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Returns true if both resources denote the same catalog node
    pub fn same_node(&self, other: &Resource) -> bool {
        self.url == other.url && self.resource_type == other.resource_type
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.display_name, self.resource_type)
    }
}

/// A resource together with its discovered children
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceNode {
    pub resource: Resource,
    pub children: Vec<ResourceNode>,
}

impl ResourceNode {
    pub fn leaf(resource: Resource) -> Self {
        Self {
            resource,
            children: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, including this one
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(ResourceNode::count).sum::<usize>()
    }

    /// Depth-first iterator over the resources of this subtree
    pub fn iter(&self) -> impl Iterator<Item = &Resource> + '_ {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(&node.resource)
        })
    }
}
