use std::sync::Arc;

use async_trait::async_trait;
use gridstore_core::{
    Row, RowPredicate, RowTransform, SchemaRegistry, StoreError, TableData, TableStore,
};
use tracing::warn;

use crate::cache::ReadCache;
use crate::retry::RetryPolicy;

/// Caching/retry wrapper over a backend.
///
/// Reads go through the time-bucketed [`ReadCache`]; a miss fetches from the
/// inner backend under the [`RetryPolicy`]. When rate-limit retries are
/// exhausted the read degrades to the schema-shaped empty result instead of
/// raising - callers must treat an empty table as "maybe real, maybe a fetch
/// failure" and not infer business meaning from it alone.
///
/// Mutations bypass the cache entirely and delegate to the inner backend;
/// data written inside a TTL window becomes visible to cached readers only
/// at bucket rollover or after [`CachedStore::clear_cache`].
pub struct CachedStore {
    inner: Arc<dyn TableStore>,
    registry: Arc<SchemaRegistry>,
    cache: ReadCache,
    policy: RetryPolicy,
}

impl CachedStore {
    pub fn new(
        inner: Arc<dyn TableStore>,
        registry: Arc<SchemaRegistry>,
        cache: ReadCache,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            inner,
            registry,
            cache,
            policy,
        }
    }

    /// Drop all cached snapshots (manual refresh).
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

#[async_trait]
impl TableStore for CachedStore {
    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }

    async fn ensure_tables(&self, registry: &SchemaRegistry) -> Result<(), StoreError> {
        self.inner.ensure_tables(registry).await
    }

    async fn read_table(&self, name: &str) -> Result<TableData, StoreError> {
        if let Some(snapshot) = self.cache.get(name) {
            return Ok((*snapshot).clone());
        }

        // Serialize concurrent misses per table so one fetch serves them all.
        let guard = self.cache.fetch_guard(name);
        let _held = guard.lock().await;
        if let Some(snapshot) = self.cache.get(name) {
            return Ok((*snapshot).clone());
        }

        match self.policy.run(|| self.inner.read_table(name)).await {
            Ok(table) => {
                self.cache.insert(name, Arc::new(table.clone()));
                Ok(table)
            }
            Err(e) if e.is_rate_limited() => {
                // Degraded, not cached: the next bucket's read tries again.
                warn!(
                    "Rate-limit retries exhausted reading {}, substituting empty result: {}",
                    name, e
                );
                Ok(self.registry.empty_table(name))
            }
            Err(e) => Err(e),
        }
    }

    async fn append_row(&self, name: &str, row: &Row) -> Result<(), StoreError> {
        self.inner.append_row(name, row).await
    }

    async fn replace_table(
        &self,
        name: &str,
        columns: &[String],
        rows: Vec<Row>,
    ) -> Result<(), StoreError> {
        self.inner.replace_table(name, columns, rows).await
    }

    async fn update_rows(
        &self,
        name: &str,
        predicate: RowPredicate<'_>,
        transform: RowTransform<'_>,
    ) -> Result<u64, StoreError> {
        self.inner.update_rows(name, predicate, transform).await
    }
}
