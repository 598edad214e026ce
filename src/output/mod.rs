//! Output module for crawl results
//!
//! This module handles:
//! - Collecting a crawl into a [`CatalogReport`]
//! - Rendering it as an indented text tree
//! - Writing it as a markdown report

mod markdown;
mod tree;

pub use markdown::{format_markdown, write_markdown};
pub use tree::format_tree;

use crate::model::{Filter, ResourceNode, ResourceType, ServerInfo};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Everything needed to render the result of one crawl
#[derive(Debug, Clone)]
pub struct CatalogReport {
    /// Connection string as the user typed it
    pub connection: String,

    /// Resolved server, when the connection went through server resolution
    pub server: Option<ServerInfo>,

    pub filter: Filter,

    pub generated_at: DateTime<Utc>,

    pub nodes: Vec<ResourceNode>,
}

impl CatalogReport {
    pub fn new(connection: impl Into<String>, filter: Filter, nodes: Vec<ResourceNode>) -> Self {
        Self {
            connection: connection.into(),
            server: None,
            filter,
            generated_at: Utc::now(),
            nodes,
        }
    }

    pub fn with_server(mut self, server: Option<ServerInfo>) -> Self {
        self.server = server;
        self
    }

    /// Total number of resources in the report
    pub fn total(&self) -> usize {
        self.nodes.iter().map(ResourceNode::count).sum()
    }

    /// Number of resources per type, ordered by type name
    pub fn type_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for resource in self.nodes.iter().flat_map(|node| node.iter()) {
            *counts.entry(resource.resource_type.to_string()).or_insert(0) += 1;
        }
        counts
    }

    /// Number of resources of one type
    pub fn count_of(&self, resource_type: ResourceType) -> usize {
        self.nodes
            .iter()
            .flat_map(|node| node.iter())
            .filter(|r| r.resource_type == resource_type)
            .count()
    }

    /// Number of service roots of any type
    pub fn service_count(&self) -> usize {
        self.count_where(ResourceType::is_service)
    }

    /// Number of layers, editable layers and group layers
    pub fn layer_count(&self) -> usize {
        self.count_where(ResourceType::is_layer)
    }

    fn count_where(&self, predicate: impl Fn(&ResourceType) -> bool) -> usize {
        self.nodes
            .iter()
            .flat_map(|node| node.iter())
            .filter(|r| predicate(&r.resource_type))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Resource;

    pub(crate) fn sample_nodes() -> Vec<ResourceNode> {
        let base = "https://gis.example.com/arcgis/rest/services";
        vec![
            ResourceNode {
                resource: Resource::new(format!("{}/Transport", base), "Transport", ResourceType::Folder),
                children: vec![ResourceNode {
                    resource: Resource::new(
                        format!("{}/Transport/Roads/MapServer", base),
                        "Roads",
                        ResourceType::MapServer,
                    ),
                    children: vec![ResourceNode::leaf(
                        Resource::new(
                            format!("{}/Transport/Roads/MapServer/0", base),
                            "Highways",
                            ResourceType::Layer,
                        )
                        .with_tag("0"),
                    )],
                }],
            },
            ResourceNode::leaf(Resource::new(
                format!("{}/Elevation/ImageServer", base),
                "Elevation",
                ResourceType::ImageServer,
            )),
        ]
    }

    #[test]
    fn test_counts() {
        let report = CatalogReport::new("gis.example.com", Filter::empty(), sample_nodes());
        assert_eq!(report.total(), 4);
        assert_eq!(report.count_of(ResourceType::Layer), 1);

        let counts = report.type_counts();
        assert_eq!(counts.get("Folder"), Some(&1));
        assert_eq!(counts.get("ImageServer"), Some(&1));
        assert_eq!(counts.get("Field"), None);

        assert_eq!(report.service_count(), 2);
        assert_eq!(report.layer_count(), 1);
    }
}
