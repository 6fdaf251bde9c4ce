use gridstore_core::{Row, TableData, Value};
use serde::{Deserialize, Serialize};

fn default_version() -> u32 {
    1
}

/// On-disk shape of the whole store: every table, in creation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoreFile {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub tables: Vec<StoredTable>,
}

impl Default for StoreFile {
    fn default() -> Self {
        Self {
            version: default_version(),
            tables: Vec::new(),
        }
    }
}

/// One table on disk: its header (canonical column order) followed by rows
/// as cell arrays aligned to that header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredTable {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
}

impl StoreFile {
    pub(crate) fn table(&self, name: &str) -> Option<&StoredTable> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub(crate) fn table_mut(&mut self, name: &str) -> Option<&mut StoredTable> {
        self.tables.iter_mut().find(|t| t.name == name)
    }

    /// Install a table, replacing any existing one with the same name while
    /// keeping its position in the file.
    pub(crate) fn put_table(&mut self, table: StoredTable) {
        match self.table_mut(&table.name) {
            Some(existing) => *existing = table,
            None => self.tables.push(table),
        }
    }
}

impl StoredTable {
    pub(crate) fn empty(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Build the on-disk form from rows, aligning each row to `columns`.
    pub(crate) fn from_rows(name: impl Into<String>, columns: Vec<String>, rows: &[Row]) -> Self {
        let rows = rows.iter().map(|r| r.values_in(&columns)).collect();
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    /// The caller-facing snapshot. Every row carries exactly the table's
    /// columns; short cell arrays are padded with nulls.
    pub(crate) fn to_table_data(&self) -> TableData {
        let rows = self
            .rows
            .iter()
            .map(|cells| Row::from_cells(&self.columns, cells.clone()))
            .collect();
        TableData::new(self.name.clone(), self.columns.clone(), rows)
    }
}
