//! Token lookup for authenticated requests
//!
//! The crawler never manages credentials itself. Before each probe it asks a
//! [`CredentialStore`] for a token matching the target host and the
//! configured username and appends it to the request when one is found.

use crate::config::CredentialEntry;
use crate::url::matches_host_pattern;

/// Source of access tokens keyed by host and username
pub trait CredentialStore: Send + Sync {
    /// Returns the token to use for `host`, if any
    fn token_for(&self, host: &str, username: Option<&str>) -> Option<String>;
}

/// Store that never has a token
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialStore for NoCredentials {
    fn token_for(&self, _host: &str, _username: Option<&str>) -> Option<String> {
        None
    }
}

/// Store backed by the `[[credentials]]` configuration entries
///
/// Entries are searched in order. An entry naming the requested username is
/// preferred over one without a username; an entry for a different username
/// never matches.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialStore {
    entries: Vec<CredentialEntry>,
}

impl StaticCredentialStore {
    pub fn from_entries(entries: &[CredentialEntry]) -> Self {
        Self {
            entries: entries.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CredentialStore for StaticCredentialStore {
    fn token_for(&self, host: &str, username: Option<&str>) -> Option<String> {
        let mut fallback = None;

        for entry in self
            .entries
            .iter()
            .filter(|e| matches_host_pattern(&e.host, host))
        {
            match (entry.username.as_deref(), username) {
                (Some(owner), Some(wanted)) if owner.eq_ignore_ascii_case(wanted) => {
                    return Some(entry.token.clone());
                }
                (None, _) if fallback.is_none() => fallback = Some(entry.token.clone()),
                _ => {}
            }
        }

        fallback
    }
}
