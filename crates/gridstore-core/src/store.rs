use async_trait::async_trait;

use crate::error::StoreError;
use crate::row::{Row, TableData};
use crate::schema::SchemaRegistry;

/// Row selector for [`TableStore::update_rows`]. Must be pure: the engine
/// guarantees it is evaluated once per row.
pub type RowPredicate<'a> = &'a (dyn Fn(&Row) -> bool + Send + Sync);

/// Row rewrite for [`TableStore::update_rows`]. Applied exactly once to each
/// selected row; non-selected rows are written back untouched.
pub type RowTransform<'a> = &'a (dyn Fn(&Row) -> Row + Send + Sync);

/// Storage backend abstraction over a named-table medium.
///
/// Contract highlights shared by all implementations:
/// - reads of an absent table return the schema-shaped empty result, never
///   an error;
/// - every mutation is durable before the call returns;
/// - rows read back carry exactly the table's current columns, with missing
///   cells as `Null`;
/// - `append_row` rejects columns the table does not have with
///   `StoreError::InvalidArgument` (same on both backends).
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Backend identifier (e.g. "local", "remote").
    fn backend_name(&self) -> &'static str;

    /// Materialize every table the registry declares, with its declared
    /// column order. Tables already present are left as-is; a header
    /// mismatch is logged as a warning and never fails the operation.
    async fn ensure_tables(&self, registry: &SchemaRegistry) -> Result<(), StoreError>;

    /// All rows currently in the table, or the schema-shaped empty result
    /// when the table is absent.
    async fn read_table(&self, name: &str) -> Result<TableData, StoreError>;

    /// Append exactly one row, aligned to the table's existing column order.
    async fn append_row(&self, name: &str, row: &Row) -> Result<(), StoreError>;

    /// Discard the table's existing rows and install `rows` under the
    /// caller-supplied column order.
    async fn replace_table(
        &self,
        name: &str,
        columns: &[String],
        rows: Vec<Row>,
    ) -> Result<(), StoreError>;

    /// Apply `transform` to every row matching `predicate`, write the full
    /// table back, and return the match count. Zero matches returns 0 and
    /// leaves the table unchanged.
    async fn update_rows(
        &self,
        name: &str,
        predicate: RowPredicate<'_>,
        transform: RowTransform<'_>,
    ) -> Result<u64, StoreError>;
}
