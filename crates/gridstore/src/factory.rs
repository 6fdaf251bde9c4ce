use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use gridstore_core::{SchemaRegistry, TableStore};
use gridstore_local::LocalFileStore;
use gridstore_remote::{ApiClient, RemoteTableStore};
use tracing::{info, warn};

use crate::cache::ReadCache;
use crate::cached::CachedStore;
use crate::clock::SystemClock;
use crate::retry::RetryPolicy;

/// Read-only view of the application's settings service.
///
/// The storage engine consumes exactly two keys: `use_remote` and
/// `remote_table_id`.
pub trait Settings: Send + Sync {
    fn get_setting(&self, key: &str, default: &str) -> String;
}

/// Map-backed [`Settings`] for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct StaticSettings {
    values: HashMap<String, String>,
}

impl StaticSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl Settings for StaticSettings {
    fn get_setting(&self, key: &str, default: &str) -> String {
        self.values
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }
}

/// Everything the factory needs besides the two settings keys.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Path of the local store file (also the fallback when remote is
    /// misconfigured).
    pub local_path: PathBuf,
    /// Base URL of the worksheet API.
    pub api_base_url: String,
    /// Bearer token for the worksheet API; `None` disables remote.
    pub api_token: Option<String>,
    /// TTL of the remote read cache.
    pub cache_ttl: Duration,
    /// Backoff policy for quota-limited remote reads.
    pub retry: RetryPolicy,
}

impl StoreOptions {
    pub fn new(local_path: impl Into<PathBuf>) -> Self {
        Self {
            local_path: local_path.into(),
            api_base_url: String::new(),
            api_token: None,
            cache_ttl: Duration::from_secs(60),
            retry: RetryPolicy::default(),
        }
    }
}

fn truthy(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

/// Choose and construct the backend.
///
/// Remote is used only when `use_remote` is truthy, `remote_table_id` is
/// set, and an API token is available; any misconfiguration logs the reason
/// and falls back to the local file backend. This fallback is deliberate
/// availability-over-strictness: backend selection never fails the caller.
pub fn build_store(
    settings: &dyn Settings,
    registry: Arc<SchemaRegistry>,
    options: StoreOptions,
) -> Arc<dyn TableStore> {
    if truthy(&settings.get_setting("use_remote", "false")) {
        let resource_id = settings.get_setting("remote_table_id", "");
        if resource_id.is_empty() {
            warn!("Remote storage requested but remote_table_id is empty, using local file");
        } else {
            match options.api_token.as_deref().filter(|t| !t.is_empty()) {
                Some(token) => {
                    let client = ApiClient::new(options.api_base_url.as_str(), resource_id, token);
                    let remote = Arc::new(RemoteTableStore::new(client, Arc::clone(&registry)));
                    let cache = ReadCache::new(options.cache_ttl, Arc::new(SystemClock));
                    info!("Using remote worksheet backend");
                    return Arc::new(CachedStore::new(remote, registry, cache, options.retry));
                }
                None => {
                    warn!("Remote storage requested but no API token available, using local file");
                }
            }
        }
    }

    info!("Using local file backend at {}", options.local_path.display());
    Arc::new(LocalFileStore::new(options.local_path, registry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn registry() -> Arc<SchemaRegistry> {
        Arc::new(SchemaRegistry::new().with_table("Items", &["id"]))
    }

    fn options(temp: &TempDir, token: Option<&str>) -> StoreOptions {
        let mut options = StoreOptions::new(temp.path().join("store.json"));
        options.api_base_url = "http://127.0.0.1:1".to_string();
        options.api_token = token.map(String::from);
        options
    }

    #[test]
    fn test_local_when_remote_not_requested() {
        let temp = TempDir::new().unwrap();
        let settings = StaticSettings::new();
        let store = build_store(&settings, registry(), options(&temp, Some("tok")));
        assert_eq!(store.backend_name(), "local");
    }

    #[test]
    fn test_remote_when_fully_configured() {
        let temp = TempDir::new().unwrap();
        let settings = StaticSettings::new()
            .with("use_remote", "true")
            .with("remote_table_id", "sheet-1");
        let store = build_store(&settings, registry(), options(&temp, Some("tok")));
        assert_eq!(store.backend_name(), "remote");
    }

    #[test]
    fn test_missing_resource_id_falls_back_to_local() {
        let temp = TempDir::new().unwrap();
        let settings = StaticSettings::new().with("use_remote", "true");
        let store = build_store(&settings, registry(), options(&temp, Some("tok")));
        assert_eq!(store.backend_name(), "local");
    }

    #[test]
    fn test_missing_token_falls_back_to_local() {
        let temp = TempDir::new().unwrap();
        let settings = StaticSettings::new()
            .with("use_remote", "yes")
            .with("remote_table_id", "sheet-1");
        let store = build_store(&settings, registry(), options(&temp, None));
        assert_eq!(store.backend_name(), "local");
    }
}
