use url::Url;

/// Extracts the lowercase host from a URL string
///
/// Connection strings without a scheme are read as `http://` URLs.
///
/// # Examples
///
/// ```
/// use catalog_ripple::url::host_of;
///
/// assert_eq!(host_of("https://GIS.example.com/arcgis"), Some("gis.example.com".to_string()));
/// assert_eq!(host_of("gis.example.com:6443/arcgis"), Some("gis.example.com".to_string()));
/// ```
pub fn host_of(url: &str) -> Option<String> {
    parse_lenient(url)?.host_str().map(|h| h.to_lowercase())
}

/// Returns the origin (`scheme://host[:port]`) of a URL string
pub fn origin_of(url: &str) -> Option<String> {
    let parsed = parse_lenient(url)?;
    parsed.host_str()?;
    Some(parsed.origin().ascii_serialization())
}

/// Checks if a host matches a credential host pattern
///
/// Patterns are either exact hosts or `*.`-prefixed wildcards, which match
/// the base host itself and any subdomain. Matching ignores case.
///
/// # Examples
///
/// ```
/// use catalog_ripple::url::matches_host_pattern;
///
/// assert!(matches_host_pattern("*.example.com", "gis.example.com"));
/// assert!(matches_host_pattern("*.example.com", "example.com"));
/// assert!(!matches_host_pattern("gis.example.com", "maps.example.com"));
/// ```
pub fn matches_host_pattern(pattern: &str, host: &str) -> bool {
    let pattern = pattern.to_ascii_lowercase();
    let host = host.to_ascii_lowercase();
    match pattern.strip_prefix("*.") {
        Some(base) => host == base || host.ends_with(&format!(".{}", base)),
        None => host == pattern,
    }
}

fn parse_lenient(url: &str) -> Option<Url> {
    let trimmed = url.trim();
    if trimmed.contains("://") {
        Url::parse(trimmed).ok()
    } else {
        Url::parse(&format!("http://{}", trimmed)).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_of() {
        assert_eq!(host_of("https://gis.example.com/"), Some("gis.example.com".to_string()));
        assert_eq!(host_of("https://EXAMPLE.COM:8443/x"), Some("example.com".to_string()));
        assert_eq!(host_of("example.com/arcgis"), Some("example.com".to_string()));
        assert_eq!(host_of("http://"), None);
    }

    #[test]
    fn test_origin_of() {
        assert_eq!(
            origin_of("https://gis.example.com/arcgis/rest/services?f=json"),
            Some("https://gis.example.com".to_string())
        );
        assert_eq!(
            origin_of("https://gis.example.com:6443/arcgis"),
            Some("https://gis.example.com:6443".to_string())
        );
        assert_eq!(
            origin_of("http://gis.example.com:80/arcgis"),
            Some("http://gis.example.com".to_string())
        );
    }

    #[test]
    fn test_exact_pattern() {
        assert!(matches_host_pattern("gis.example.com", "gis.example.com"));
        assert!(matches_host_pattern("GIS.example.com", "gis.EXAMPLE.com"));
        assert!(!matches_host_pattern("example.com", "gis.example.com"));
    }

    #[test]
    fn test_wildcard_pattern() {
        assert!(matches_host_pattern("*.example.com", "example.com"));
        assert!(matches_host_pattern("*.example.com", "a.b.example.com"));
        assert!(!matches_host_pattern("*.example.com", "example.org"));
        assert!(!matches_host_pattern("*.example.com", "badexample.com"));
    }
}
