//! Remote worksheet storage backend.
//!
//! Tables map 1:1 to named worksheets inside one remote resource, addressed
//! by an opaque identifier. Every cell travels as UTF-8 text; values are
//! coerced on write and parsed back on read. There is no partial-update
//! primitive on the wire, so `replace_table` and `update_rows` rewrite the
//! whole worksheet - concurrent writers race with last-writer-wins results.

mod api;
mod store;

pub use api::ApiClient;
pub use store::RemoteTableStore;
