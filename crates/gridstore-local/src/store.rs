use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use gridstore_core::{
    Row, RowPredicate, RowTransform, SchemaRegistry, StoreError, TableData, TableStore,
};
use tokio::fs;
use tracing::{debug, instrument, warn};

use crate::file::{StoreFile, StoredTable};
use crate::lock::PathLocks;

/// Local single-file storage backend.
///
/// The store owns one JSON file holding every table. Each operation acquires
/// the advisory lock for that path, loads the whole file, computes, and (for
/// mutations) commits by writing a temp sibling and renaming it over the
/// original. Callers serialize rather than interleave; the cost of any
/// operation is proportional to total file size, not rows touched.
///
/// Only these public trait methods acquire the lock. Internal helpers
/// operate on an already-loaded [`StoreFile`] and assume the lock is held,
/// so no operation can re-acquire mid-flight.
#[derive(Debug)]
pub struct LocalFileStore {
    path: PathBuf,
    registry: Arc<SchemaRegistry>,
    locks: PathLocks,
}

impl LocalFileStore {
    /// Create a store over the given file path. The file is created lazily
    /// on the first mutation (or by `ensure_tables`).
    pub fn new(path: impl AsRef<Path>, registry: Arc<SchemaRegistry>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            registry,
            locks: PathLocks::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut os = self.path.as_os_str().to_os_string();
        os.push(".tmp");
        PathBuf::from(os)
    }

    /// Load the whole file. Caller must hold the path lock. Returns the
    /// parsed store and whether the file existed.
    async fn load(&self) -> Result<(StoreFile, bool), StoreError> {
        match fs::read_to_string(&self.path).await {
            Ok(json) => {
                let store = serde_json::from_str(&json).map_err(|e| {
                    StoreError::Serialization(format!(
                        "failed to parse store file {}: {}",
                        self.path.display(),
                        e
                    ))
                })?;
                Ok((store, true))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok((StoreFile::default(), false))
            }
            Err(e) => Err(StoreError::Io(format!(
                "failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    /// Atomically replace the file with the new content. Caller must hold
    /// the path lock. If the temp write fails the original is untouched and
    /// the temp file is removed; a rename failure propagates with the prior
    /// committed file still authoritative.
    async fn commit(&self, store: &StoreFile) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(store).map_err(|e| {
            StoreError::Serialization(format!("failed to serialize store file: {}", e))
        })?;

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, &json).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StoreError::Io(format!(
                "failed to write {}: {}",
                temp_path.display(),
                e
            )));
        }
        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            StoreError::Io(format!(
                "failed to rename {} over {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;
        Ok(())
    }
}

#[async_trait]
impl TableStore for LocalFileStore {
    fn backend_name(&self) -> &'static str {
        "local"
    }

    #[instrument(skip(self, registry), level = "debug")]
    async fn ensure_tables(&self, registry: &SchemaRegistry) -> Result<(), StoreError> {
        let _guard = self.locks.acquire(&self.path).await?;
        let (mut store, existed) = self.load().await?;

        let mut changed = false;
        for (name, columns) in registry.iter() {
            match store.table(name) {
                Some(table) => {
                    if table.columns != columns {
                        warn!(
                            "Table {} header mismatch: declared {:?}, found {:?}",
                            name, columns, table.columns
                        );
                    }
                }
                None => {
                    store.put_table(StoredTable::empty(name, columns.to_vec()));
                    changed = true;
                }
            }
        }

        if changed || !existed {
            self.commit(&store).await?;
            debug!("Ensured {} declared tables in {}", registry.iter().count(), self.path.display());
        }
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn read_table(&self, name: &str) -> Result<TableData, StoreError> {
        let _guard = self.locks.acquire(&self.path).await?;
        let (store, _) = self.load().await?;

        match store.table(name) {
            Some(table) => {
                debug!("Read table {} ({} rows)", name, table.rows.len());
                Ok(table.to_table_data())
            }
            None => {
                debug!("Table {} absent, returning declared schema", name);
                Ok(self.registry.empty_table(name))
            }
        }
    }

    #[instrument(skip(self, row), level = "debug")]
    async fn append_row(&self, name: &str, row: &Row) -> Result<(), StoreError> {
        let _guard = self.locks.acquire(&self.path).await?;
        let (mut store, _) = self.load().await?;

        // Lazy creation: an absent table takes the declared columns, or the
        // row's own order when the name is undeclared.
        let columns = match store.table(name) {
            Some(table) => table.columns.clone(),
            None => self
                .registry
                .columns_for(name)
                .map(|c| c.to_vec())
                .unwrap_or_else(|| row.columns().map(String::from).collect()),
        };

        let unknown = row.unknown_columns(&columns);
        if !unknown.is_empty() {
            return Err(StoreError::InvalidArgument(format!(
                "row for table {} has unknown columns: {}",
                name,
                unknown.join(", ")
            )));
        }

        let cells = row.values_in(&columns);
        match store.table_mut(name) {
            Some(table) => table.rows.push(cells),
            None => {
                let mut table = StoredTable::empty(name, columns);
                table.rows.push(cells);
                store.put_table(table);
            }
        }

        self.commit(&store).await?;
        debug!("Appended one row to table {}", name);
        Ok(())
    }

    #[instrument(skip(self, rows), level = "debug", fields(rows = rows.len()))]
    async fn replace_table(
        &self,
        name: &str,
        columns: &[String],
        rows: Vec<Row>,
    ) -> Result<(), StoreError> {
        let _guard = self.locks.acquire(&self.path).await?;
        let (mut store, _) = self.load().await?;

        let count = rows.len();
        store.put_table(StoredTable::from_rows(name, columns.to_vec(), &rows));
        self.commit(&store).await?;

        debug!("Replaced table {} with {} rows", name, count);
        Ok(())
    }

    #[instrument(skip(self, predicate, transform), level = "debug")]
    async fn update_rows(
        &self,
        name: &str,
        predicate: RowPredicate<'_>,
        transform: RowTransform<'_>,
    ) -> Result<u64, StoreError> {
        let _guard = self.locks.acquire(&self.path).await?;
        let (mut store, _) = self.load().await?;

        let Some(table) = store.table_mut(name) else {
            debug!("Table {} absent, update matched 0 rows", name);
            return Ok(0);
        };

        let columns = table.columns.clone();
        let mut matched = 0u64;
        for cells in table.rows.iter_mut() {
            let row = Row::from_cells(&columns, cells.clone());
            if predicate(&row) {
                matched += 1;
                *cells = transform(&row).values_in(&columns);
            }
        }

        // Zero matches leaves the file byte-for-byte untouched.
        if matched == 0 {
            debug!("Update on table {} matched no rows", name);
            return Ok(0);
        }

        self.commit(&store).await?;
        debug!("Updated {} rows in table {}", matched, name);
        Ok(matched)
    }
}
