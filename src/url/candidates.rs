//! Candidate REST endpoint generation
//!
//! Users type anything from `gis.example.com` to a full
//! `https://gis.example.com/arcgis/rest/services` URL. This module expands
//! such a connection string into the ordered list of services-directory URLs
//! worth probing.

use crate::{UrlError, UrlResult};
use url::Url;

/// How a candidate completes the path of the connection string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Completion {
    /// Append `arcgis/rest/services`
    FullPath,
    /// Append `rest/services`
    MinimalPath,
    /// The input already is the services directory
    AsIs,
    /// The input is the REST root; append `services`
    RestRoot,
}

/// Probe order within one scheme
const COMPLETION_ORDER: [Completion; 4] = [
    Completion::FullPath,
    Completion::MinimalPath,
    Completion::AsIs,
    Completion::RestRoot,
];

/// Generates the ordered, de-duplicated list of candidate catalog URLs
///
/// Candidates are the cross product of three choices: full versus minimal
/// REST path, `http` versus `https`, and appending a path versus taking the
/// input as already complete. All `http` candidates come before `https` ones
/// and full-path guesses come first within a scheme.
///
/// When the input already ends in `arcgis`, `rest` or `services`, every slot
/// collapses to the one correct completion. If the input also names its
/// scheme, that scheme is kept and a single candidate results.
///
/// # Arguments
///
/// * `connection` - The connection string as typed by the user
///
/// # Returns
///
/// * `Ok(Vec<String>)` - Candidate URLs in probe order
/// * `Err(UrlError)` - The connection string is empty, has an unsupported
///   scheme, or cannot form a valid URL
///
/// # Examples
///
/// ```
/// use catalog_ripple::url::candidate_urls;
///
/// let candidates = candidate_urls("myserver.com").unwrap();
/// assert_eq!(candidates.len(), 8);
/// assert_eq!(candidates[0], "http://myserver.com/arcgis/rest/services");
///
/// let exact = candidate_urls("https://myserver.com/arcgis/rest/services").unwrap();
/// assert_eq!(exact, vec!["https://myserver.com/arcgis/rest/services"]);
/// ```
pub fn candidate_urls(connection: &str) -> UrlResult<Vec<String>> {
    let trimmed = super::strip_query(connection.trim());
    if trimmed.is_empty() {
        return Err(UrlError::EmptyConnection);
    }

    let (scheme, rest) = split_scheme(trimmed)?;
    let rest = rest.trim_end_matches('/');
    if rest.is_empty() {
        return Err(UrlError::MissingHost);
    }

    let recognized = recognized_completion(rest);

    let schemes: [&str; 2] = match (scheme.as_deref(), recognized.is_some()) {
        (Some(given), true) => [given, given],
        (Some(given), false) => [given, "https"],
        (None, _) => ["http", "https"],
    };

    let mut candidates: Vec<String> = Vec::with_capacity(8);
    for scheme in schemes {
        for completion in COMPLETION_ORDER {
            let path = match recognized {
                Some(suffix) => format!("{}{}", rest, suffix),
                None => complete(rest, completion),
            };
            let candidate = normalize_candidate(&format!("{}://{}", scheme, path))?;
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }
    }

    tracing::trace!(
        "Resolved {} candidate URLs for '{}'",
        candidates.len(),
        connection
    );

    Ok(candidates)
}

/// Splits an optional scheme from the connection string
fn split_scheme(input: &str) -> UrlResult<(Option<String>, &str)> {
    match input.find("://") {
        Some(idx) => {
            let scheme = input[..idx].to_ascii_lowercase();
            if scheme != "http" && scheme != "https" {
                return Err(UrlError::InvalidScheme(format!(
                    "Only HTTP and HTTPS schemes are supported, got: {}",
                    scheme
                )));
            }
            Ok((Some(scheme), &input[idx + 3..]))
        }
        None => Ok((None, input)),
    }
}

/// Returns the suffix completing a path whose last segment is already known
fn recognized_completion(rest: &str) -> Option<&'static str> {
    let last = rest.rsplit('/').next()?;
    // A bare host such as "rest.example.com" is not a path segment
    if !rest.contains('/') {
        return None;
    }

    if last.eq_ignore_ascii_case("services") {
        Some("")
    } else if last.eq_ignore_ascii_case("rest") {
        Some("/services")
    } else if last.eq_ignore_ascii_case("arcgis") {
        Some("/rest/services")
    } else {
        None
    }
}

fn complete(rest: &str, completion: Completion) -> String {
    match completion {
        Completion::FullPath => format!("{}/arcgis/rest/services", rest),
        Completion::MinimalPath => format!("{}/rest/services", rest),
        Completion::AsIs => rest.to_string(),
        Completion::RestRoot => format!("{}/services", rest),
    }
}

/// Validates a candidate and normalizes host case
fn normalize_candidate(raw: &str) -> UrlResult<String> {
    let url = Url::parse(raw).map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;
    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}
