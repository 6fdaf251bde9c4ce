//! Dual-backend tabular storage engine.
//!
//! One contract ([`TableStore`]) over two media with very different
//! characteristics:
//! - [`LocalFileStore`]: one JSON file, advisory path lock, atomic
//!   temp-write-then-rename commit - serialized, crash-safe.
//! - [`RemoteTableStore`]: one worksheet per table behind a quota-limited
//!   REST API - per-call requests, text cells, last-writer-wins rewrites.
//!
//! This crate layers [`CachedStore`] (time-bucketed read cache plus bounded
//! exponential backoff on quota errors) over the remote backend and selects
//! a backend from two settings keys via [`build_store`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use gridstore::{build_store, SchemaRegistry, StaticSettings, StoreOptions};
//!
//! let registry = Arc::new(SchemaRegistry::new().with_table("Items", &["id", "name", "qty"]));
//! let settings = StaticSettings::new().with("use_remote", "false");
//! let store = build_store(&settings, registry, StoreOptions::new("data/store.json"));
//! ```

mod cache;
mod cached;
mod clock;
mod factory;
mod retry;

pub use cache::ReadCache;
pub use cached::CachedStore;
pub use clock::{Clock, ManualClock, SystemClock};
pub use factory::{build_store, Settings, StaticSettings, StoreOptions};
pub use retry::RetryPolicy;

pub use gridstore_core::{
    Row, RowPredicate, RowTransform, SchemaRegistry, StoreError, TableData, TableStore, Value,
};
pub use gridstore_local::LocalFileStore;
pub use gridstore_remote::{ApiClient, RemoteTableStore};
