//! Resource type classification from URL paths
//!
//! Lets a user paste any REST URL (a services directory, a folder, a service
//! root or a deep sublayer) and recovers what kind of node it names along
//! with its parent context.

use crate::model::ResourceType;

/// Result of classifying a REST URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Kind of node the URL names
    pub resource_type: ResourceType,

    /// The URL without query string or trailing slash
    pub url: String,

    /// URL of the containing node, when the path reveals one
    pub parent_url: Option<String>,

    /// Sub-id for sublayer and tool references (the trailing number)
    pub tag: Option<String>,
}

impl Classification {
    /// Human-readable name derived from the URL path
    ///
    /// Services are named after their service name, sublayers after their
    /// service plus id, folders after the folder and servers after the host.
    pub fn display_name(&self) -> String {
        let segments = path_segments(&self.url);
        match self.resource_type {
            ResourceType::MapServer
            | ResourceType::FeatureServer
            | ResourceType::ImageServer
            | ResourceType::GPServer
                if self.tag.is_none() =>
            {
                segments
                    .iter()
                    .rev()
                    .nth(1)
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| self.url.clone())
            }
            ResourceType::Layer
            | ResourceType::EditableLayer
            | ResourceType::GroupLayer
            | ResourceType::GPServer => {
                let service = segments.iter().rev().nth(2).copied().unwrap_or("");
                format!("{} ({})", service, self.tag.as_deref().unwrap_or(""))
            }
            ResourceType::Folder => segments
                .last()
                .map(|s| s.to_string())
                .unwrap_or_else(|| self.url.clone()),
            _ => super::host_of(&self.url).unwrap_or_else(|| self.url.clone()),
        }
    }
}

/// Classifies a URL by its trailing path segments
///
/// | Trailing segments | Classification |
/// |-------------------|----------------|
/// | `…/services` | Server |
/// | `…/rest` | Server (`/services` appended) |
/// | `…/services/<folder>` | Folder |
/// | `…/<Name>/MapServer` (also FeatureServer, ImageServer, GPServer) | that service |
/// | `…/MapServer/<n>` or `…/FeatureServer/<n>` | Layer, tag `n`, parent = service |
/// | `…/GPServer/<n>` | GPServer tool reference, tag `n`, parent = service |
/// | anything else | Undefined |
///
/// Matching is case-insensitive; the returned URL keeps the caller's casing.
///
/// # Examples
///
/// ```
/// use catalog_ripple::url::classify_url;
/// use catalog_ripple::ResourceType;
///
/// let c = classify_url("https://gis.example.com/arcgis/rest/services/Roads/MapServer/3");
/// assert_eq!(c.resource_type, ResourceType::Layer);
/// assert_eq!(c.tag.as_deref(), Some("3"));
/// assert_eq!(
///     c.parent_url.as_deref(),
///     Some("https://gis.example.com/arcgis/rest/services/Roads/MapServer")
/// );
/// ```
pub fn classify_url(url: &str) -> Classification {
    let url = super::trim_url(url);
    let segments = path_segments(&url);
    let last = segments.last().copied().unwrap_or("");
    let previous = if segments.len() >= 2 {
        segments[segments.len() - 2]
    } else {
        ""
    };

    if let Some(service_type) = service_type_of(last) {
        return Classification {
            parent_url: super::parent_of(&url).and_then(|p| super::parent_of(&p)),
            resource_type: service_type,
            url,
            tag: None,
        };
    }

    if is_numeric(last) {
        match service_type_of(previous) {
            Some(ResourceType::MapServer) | Some(ResourceType::FeatureServer) => {
                return Classification {
                    resource_type: ResourceType::Layer,
                    parent_url: super::parent_of(&url),
                    tag: Some(last.to_string()),
                    url,
                };
            }
            Some(ResourceType::GPServer) => {
                return Classification {
                    resource_type: ResourceType::GPServer,
                    parent_url: super::parent_of(&url),
                    tag: Some(last.to_string()),
                    url,
                };
            }
            _ => {}
        }
    }

    if last.eq_ignore_ascii_case("services") {
        return Classification {
            resource_type: ResourceType::Server,
            url,
            parent_url: None,
            tag: None,
        };
    }

    if last.eq_ignore_ascii_case("rest") {
        return Classification {
            resource_type: ResourceType::Server,
            url: super::join_segment(&url, "services"),
            parent_url: None,
            tag: None,
        };
    }

    if previous.eq_ignore_ascii_case("services") {
        return Classification {
            resource_type: ResourceType::Folder,
            parent_url: super::parent_of(&url),
            url,
            tag: None,
        };
    }

    Classification {
        resource_type: ResourceType::Undefined,
        url,
        parent_url: None,
        tag: None,
    }
}

/// Maps a service-type path segment to its resource type
fn service_type_of(segment: &str) -> Option<ResourceType> {
    match segment.to_ascii_lowercase().as_str() {
        "mapserver" => Some(ResourceType::MapServer),
        "featureserver" => Some(ResourceType::FeatureServer),
        "imageserver" => Some(ResourceType::ImageServer),
        "gpserver" => Some(ResourceType::GPServer),
        _ => None,
    }
}

fn is_numeric(segment: &str) -> bool {
    !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit())
}

/// Path segments after the host, empty segments dropped
fn path_segments(url: &str) -> Vec<&str> {
    let after_scheme = url.find("://").map(|i| &url[i + 3..]).unwrap_or(url);
    after_scheme
        .split('/')
        .skip(1)
        .filter(|s| !s.is_empty())
        .collect()
}
