use crate::model::ResourceNode;

/// Renders nodes as an indented tree, two spaces per level
///
/// Each line shows the display name, the type and, for layers and fields,
/// the sub-id.
///
/// # Examples
///
/// ```
/// use catalog_ripple::model::{Resource, ResourceNode, ResourceType};
/// use catalog_ripple::output::format_tree;
///
/// let node = ResourceNode::leaf(Resource::new(
///     "https://h/arcgis/rest/services/Roads/MapServer",
///     "Roads",
///     ResourceType::MapServer,
/// ));
/// assert_eq!(format_tree(&[node]), "Roads [MapServer]\n");
/// ```
pub fn format_tree(nodes: &[ResourceNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(&mut out, node, 0);
    }
    out
}

fn write_node(out: &mut String, node: &ResourceNode, depth: usize) {
    let resource = &node.resource;
    out.push_str(&"  ".repeat(depth));
    out.push_str(&resource.to_string());
    if let Some(tag) = resource.tag.as_deref() {
        if tag != resource.display_name {
            out.push_str(&format!(" #{}", tag));
        }
    }
    if resource.proxy_url.is_some() {
        out.push_str(" (via proxy)");
    }
    out.push('\n');

    for child in &node.children {
        write_node(out, child, depth + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Resource, ResourceType};

    #[test]
    fn test_nested_indentation() {
        let tree = vec![ResourceNode {
            resource: Resource::new("https://h/rest/services/F", "F", ResourceType::Folder)
                .with_proxy(Some("https://p/proxy".to_string())),
            children: vec![ResourceNode {
                resource: Resource::new("https://h/rest/services/F/S/MapServer/2", "Lines", ResourceType::Layer)
                    .with_tag("2"),
                children: vec![ResourceNode::leaf(
                    Resource::new("https://h/rest/services/F/S/MapServer/2", "NAME", ResourceType::Field)
                        .with_tag("NAME"),
                )],
            }],
        }];

        assert_eq!(
            format_tree(&tree),
            "F [Folder] (via proxy)\n  Lines [Layer] #2\n    NAME [Field]\n"
        );
    }

    #[test]
    fn test_empty() {
        assert_eq!(format_tree(&[]), "");
    }
}
