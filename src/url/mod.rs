//! URL handling module for Catalog-Ripple
//!
//! This module provides candidate REST endpoint generation, resource type
//! classification from URL paths, host matching for credentials, and the
//! small path helpers the probes use to build request URLs.

mod candidates;
mod classify;
mod host;

pub use candidates::candidate_urls;
pub use classify::{classify_url, Classification};
pub use host::{host_of, matches_host_pattern, origin_of};

/// Strips the query string and fragment from a URL string
pub fn strip_query(url: &str) -> &str {
    let end = url.find(&['?', '#'][..]).unwrap_or(url.len());
    &url[..end]
}

/// Strips query, fragment, surrounding whitespace and trailing slashes
///
/// # Examples
///
/// ```
/// use catalog_ripple::url::trim_url;
///
/// assert_eq!(
///     trim_url(" https://gis.example.com/arcgis/rest/services/?f=pjson "),
///     "https://gis.example.com/arcgis/rest/services"
/// );
/// ```
pub fn trim_url(url: &str) -> String {
    strip_query(url.trim()).trim_end_matches('/').to_string()
}

/// Appends a path segment (or several, slash separated) to a base URL
pub fn join_segment(base: &str, segment: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        segment.trim_start_matches('/')
    )
}

/// Returns the last path segment of a URL, ignoring trailing slashes
pub fn last_segment(url: &str) -> Option<&str> {
    let trimmed = strip_query(url).trim_end_matches('/');
    let path_start = trimmed.find("://").map(|i| i + 3).unwrap_or(0);
    let path = &trimmed[path_start..];
    match path.rfind('/') {
        Some(idx) if idx + 1 < path.len() => Some(&path[idx + 1..]),
        _ => None,
    }
}

/// Returns the URL with its last path segment removed
pub fn parent_of(url: &str) -> Option<String> {
    let trimmed = strip_query(url).trim_end_matches('/');
    let segment = last_segment(trimmed)?;
    Some(trimmed[..trimmed.len() - segment.len() - 1].to_string())
}

/// Derives the instance info endpoint from a services directory URL
///
/// `https://host/arcgis/rest/services` becomes `https://host/arcgis/rest/info`.
pub fn info_url(services_url: &str) -> String {
    let trimmed = trim_url(services_url);
    let root = strip_suffix_ignore_case(&trimmed, "/services").unwrap_or(&trimmed);
    format!("{}/info", root)
}

/// Derives the instance root from a services directory URL
///
/// `https://host/arcgis/rest/services` becomes `https://host/arcgis`.
pub fn base_url(services_url: &str) -> String {
    let trimmed = trim_url(services_url);
    strip_suffix_ignore_case(&trimmed, "/rest/services")
        .or_else(|| strip_suffix_ignore_case(&trimmed, "/services"))
        .unwrap_or(&trimmed)
        .to_string()
}

/// Returns the services directory a catalog URL belongs to
///
/// Everything after the first `services` path segment is dropped, so a
/// folder or service URL maps back to the directory whose catalog names its
/// services (service names carry their folder prefix).
pub fn services_root(url: &str) -> String {
    let trimmed = trim_url(url);
    let host_start = trimmed.find("://").map_or(0, |i| i + 3);
    let path_start = trimmed[host_start..]
        .find('/')
        .map_or(trimmed.len(), |j| host_start + j);

    let mut offset = path_start;
    for segment in trimmed[path_start..].split('/') {
        if segment.eq_ignore_ascii_case("services") {
            return trimmed[..offset + segment.len()].to_string();
        }
        offset += segment.len() + 1;
    }
    trimmed
}

fn strip_suffix_ignore_case<'a>(value: &'a str, suffix: &str) -> Option<&'a str> {
    if value.len() >= suffix.len()
        && value.is_char_boundary(value.len() - suffix.len())
        && value[value.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
    {
        Some(&value[..value.len() - suffix.len()])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_query() {
        assert_eq!(strip_query("http://a.com/x?f=json"), "http://a.com/x");
        assert_eq!(strip_query("http://a.com/x#frag"), "http://a.com/x");
        assert_eq!(strip_query("http://a.com/x"), "http://a.com/x");
    }

    #[test]
    fn test_join_segment() {
        assert_eq!(join_segment("http://a.com/services/", "/Roads"), "http://a.com/services/Roads");
        assert_eq!(
            join_segment("http://a.com/services", "Transport/Roads/MapServer"),
            "http://a.com/services/Transport/Roads/MapServer"
        );
    }

    #[test]
    fn test_last_segment_and_parent() {
        assert_eq!(last_segment("http://a.com/x/MapServer/3/"), Some("3"));
        assert_eq!(last_segment("http://a.com"), None);
        assert_eq!(
            parent_of("http://a.com/x/MapServer/3").as_deref(),
            Some("http://a.com/x/MapServer")
        );
        assert_eq!(parent_of("http://a.com"), None);
    }

    #[test]
    fn test_info_url() {
        assert_eq!(
            info_url("https://gis.example.com/arcgis/rest/services"),
            "https://gis.example.com/arcgis/rest/info"
        );
        assert_eq!(
            info_url("https://gis.example.com/server/rest/Services/"),
            "https://gis.example.com/server/rest/info"
        );
    }

    #[test]
    fn test_services_root() {
        assert_eq!(
            services_root("https://h/arcgis/rest/services/Transport"),
            "https://h/arcgis/rest/services"
        );
        assert_eq!(
            services_root("https://h/arcgis/rest/Services/Transport/Roads/MapServer"),
            "https://h/arcgis/rest/Services"
        );
        assert_eq!(services_root("https://h/rest/services/"), "https://h/rest/services");
        assert_eq!(services_root("https://h/other"), "https://h/other");
        assert_eq!(
            services_root("h/arcgis/rest/services/Roads/MapServer"),
            "h/arcgis/rest/services"
        );
        assert_eq!(services_root("services.example.com"), "services.example.com");
    }

    #[test]
    fn test_base_url() {
        assert_eq!(
            base_url("https://gis.example.com/arcgis/rest/services"),
            "https://gis.example.com/arcgis"
        );
        assert_eq!(
            base_url("http://gis.example.com/rest/services?f=json"),
            "http://gis.example.com"
        );
    }
}
