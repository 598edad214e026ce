//! ServerInfo caching
//!
//! Resolved servers are cached by instance base URL so later crawls and
//! info lookups against the same host skip candidate probing. Entries never
//! expire unless a different [`EvictionPolicy`] is installed.

use crate::model::ServerInfo;
use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Decides when a cached entry is too old to use
pub trait EvictionPolicy: Send + Sync {
    fn is_expired(&self, inserted_at: DateTime<Utc>, now: DateTime<Utc>) -> bool;
}

/// Entries live for the whole process
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverEvict;

impl EvictionPolicy for NeverEvict {
    fn is_expired(&self, _inserted_at: DateTime<Utc>, _now: DateTime<Utc>) -> bool {
        false
    }
}

/// Entries expire a fixed time after insertion
#[derive(Debug, Clone, Copy)]
pub struct MaxAge(pub Duration);

impl EvictionPolicy for MaxAge {
    fn is_expired(&self, inserted_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - inserted_at > self.0
    }
}

#[derive(Debug, Clone)]
struct CachedServer {
    info: ServerInfo,
    inserted_at: DateTime<Utc>,
}

static GLOBAL: Lazy<Arc<ServerInfoCache>> = Lazy::new(|| Arc::new(ServerInfoCache::new()));

/// Thread-safe table of resolved servers keyed by base URL
pub struct ServerInfoCache {
    entries: Mutex<HashMap<String, CachedServer>>,
    policy: Box<dyn EvictionPolicy>,
}

impl Default for ServerInfoCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerInfoCache {
    /// Creates an empty cache that never evicts
    pub fn new() -> Self {
        Self::with_policy(NeverEvict)
    }

    pub fn with_policy(policy: impl EvictionPolicy + 'static) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            policy: Box::new(policy),
        }
    }

    /// The process-wide cache shared by crawlers that are not given their own
    pub fn global() -> Arc<ServerInfoCache> {
        GLOBAL.clone()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CachedServer>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Looks up a server by base URL, dropping it if expired
    pub fn get(&self, base_url: &str) -> Option<ServerInfo> {
        let key = cache_key(base_url);
        let mut entries = self.lock();
        let expired = match entries.get(&key) {
            Some(entry) => self.policy.is_expired(entry.inserted_at, Utc::now()),
            None => return None,
        };

        if expired {
            tracing::debug!("ServerInfo for {} expired", key);
            entries.remove(&key);
            None
        } else {
            entries.get(&key).map(|entry| entry.info.clone())
        }
    }

    /// Finds the cached server that one of the candidate URLs resolved to
    ///
    /// Candidates are checked in order; an entry only matches the candidate
    /// that originally won for its host.
    pub fn find_resolved(&self, candidates: &[String]) -> Option<ServerInfo> {
        candidates.iter().find_map(|candidate| {
            self.get(&crate::url::base_url(candidate))
                .filter(|info| info.url.eq_ignore_ascii_case(candidate))
        })
    }

    /// Inserts or replaces the entry for `info.base_url`
    pub fn insert(&self, info: ServerInfo) {
        let key = cache_key(&info.base_url);
        tracing::debug!("Caching ServerInfo for {} ({})", key, info.url);
        self.lock().insert(
            key,
            CachedServer {
                info,
                inserted_at: Utc::now(),
            },
        );
    }

    pub fn remove(&self, base_url: &str) -> Option<ServerInfo> {
        self.lock().remove(&cache_key(base_url)).map(|e| e.info)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    #[cfg(test)]
    fn backdate(&self, base_url: &str, age: Duration) {
        if let Some(entry) = self.lock().get_mut(&cache_key(base_url)) {
            entry.inserted_at = Utc::now() - age;
        }
    }
}

fn cache_key(base_url: &str) -> String {
    crate::url::trim_url(base_url).to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AuthenticationInfo;

    fn info(url: &str) -> ServerInfo {
        ServerInfo::new(url, None, AuthenticationInfo::default())
    }

    #[test]
    fn test_insert_and_get() {
        let cache = ServerInfoCache::new();
        cache.insert(info("https://gis.example.com/arcgis/rest/services"));

        let hit = cache.get("https://GIS.example.com/arcgis/").unwrap();
        assert_eq!(hit.url, "https://gis.example.com/arcgis/rest/services");
        assert_eq!(cache.len(), 1);
        assert!(cache.get("https://other.example.com/arcgis").is_none());
    }

    #[test]
    fn test_find_resolved_matches_winning_candidate() {
        let cache = ServerInfoCache::new();
        cache.insert(info("https://gis.example.com/arcgis/rest/services"));

        let candidates = vec![
            "http://gis.example.com/arcgis/rest/services".to_string(),
            "https://gis.example.com/arcgis/rest/services".to_string(),
        ];
        let hit = cache.find_resolved(&candidates).unwrap();
        assert_eq!(hit.url, candidates[1]);

        assert!(cache
            .find_resolved(&["https://gis.example.com/rest/services".to_string()])
            .is_none());
    }

    #[test]
    fn test_never_evict() {
        let cache = ServerInfoCache::new();
        cache.insert(info("https://a/arcgis/rest/services"));
        cache.backdate("https://a/arcgis", Duration::days(365));
        assert!(cache.get("https://a/arcgis").is_some());
    }

    #[test]
    fn test_max_age_evicts() {
        let cache = ServerInfoCache::with_policy(MaxAge(Duration::hours(1)));
        cache.insert(info("https://a/arcgis/rest/services"));
        assert!(cache.get("https://a/arcgis").is_some());

        cache.backdate("https://a/arcgis", Duration::hours(2));
        assert!(cache.get("https://a/arcgis").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_remove_and_clear() {
        let cache = ServerInfoCache::new();
        cache.insert(info("https://a/arcgis/rest/services"));
        cache.insert(info("https://b/arcgis/rest/services"));

        assert!(cache.remove("https://a/arcgis").is_some());
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
