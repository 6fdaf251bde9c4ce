use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use gridstore_core::TableData;
use tokio::sync::Mutex;
use tracing::debug;

use crate::clock::Clock;

/// Time-bucketed read cache.
///
/// The key is (table name, floor(now / TTL)): every read within one TTL
/// window for the same table returns the identical snapshot taken at the
/// first miss, whether or not the underlying table changed in the interim.
/// That is a bounded staleness window, not a consistency guarantee. Entries
/// are immutable once created and die when their bucket rolls over or on an
/// explicit [`ReadCache::clear`].
pub struct ReadCache {
    ttl_secs: i64,
    clock: Arc<dyn Clock>,
    entries: DashMap<String, CacheSlot>,
    fetch_guards: DashMap<String, Arc<Mutex<()>>>,
}

struct CacheSlot {
    bucket: i64,
    table: Arc<TableData>,
}

impl ReadCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl_secs: (ttl.as_secs() as i64).max(1),
            clock,
            entries: DashMap::new(),
            fetch_guards: DashMap::new(),
        }
    }

    fn current_bucket(&self) -> i64 {
        self.clock.now_unix() / self.ttl_secs
    }

    /// The cached snapshot for `name`, iff it was created in the current
    /// bucket.
    pub fn get(&self, name: &str) -> Option<Arc<TableData>> {
        let slot = self.entries.get(name)?;
        if slot.bucket == self.current_bucket() {
            Some(Arc::clone(&slot.table))
        } else {
            None
        }
    }

    /// Store a snapshot under the current bucket.
    pub fn insert(&self, name: &str, table: Arc<TableData>) {
        let bucket = self.current_bucket();
        self.entries
            .insert(name.to_string(), CacheSlot { bucket, table });
        debug!("Cached table {} for bucket {}", name, bucket);
    }

    /// Drop every entry immediately (manual refresh).
    pub fn clear(&self) {
        self.entries.clear();
        debug!("Cleared read cache");
    }

    /// Per-table mutex guarding the miss path, so concurrent misses for the
    /// same table coalesce into a single backend fetch.
    pub(crate) fn fetch_guard(&self, name: &str) -> Arc<Mutex<()>> {
        self.fetch_guards
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
