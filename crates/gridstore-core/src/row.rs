use crate::value::Value;

/// An ordered column → value record.
///
/// Column order is insertion order; backends align rows to the owning
/// table's column order on write and guarantee that a row read back carries
/// exactly the table's current columns (missing cells as `Null`, never
/// omitted).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    cells: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from (column, value) pairs, keeping their order.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            cells: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Build a row by zipping a column order with a cell vector.
    ///
    /// Extra cells are dropped; missing cells become `Null`.
    pub fn from_cells(columns: &[String], cells: Vec<Value>) -> Self {
        let mut cells = cells.into_iter();
        Self {
            cells: columns
                .iter()
                .map(|c| (c.clone(), cells.next().unwrap_or(Value::Null)))
                .collect(),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }

    /// Insert or update a cell. An existing column keeps its position; a new
    /// column is appended.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(c, _)| *c == column) {
            Some((_, v)) => *v = value,
            None => self.cells.push((column, value)),
        }
    }

    /// Consuming variant of [`Row::set`], for building rows fluently.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(c, _)| c.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.cells.iter().map(|(c, v)| (c.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cells aligned to the given column order; `Null` for columns this row
    /// doesn't carry.
    pub fn values_in(&self, columns: &[String]) -> Vec<Value> {
        columns
            .iter()
            .map(|c| self.get(c).cloned().unwrap_or(Value::Null))
            .collect()
    }

    /// A copy of this row carrying exactly the given columns, in order.
    pub fn conform_to(&self, columns: &[String]) -> Row {
        Row::from_cells(columns, self.values_in(columns))
    }

    /// Columns present in this row but not in the given order.
    pub fn unknown_columns(&self, columns: &[String]) -> Vec<String> {
        self.cells
            .iter()
            .filter(|(c, _)| !columns.contains(c))
            .map(|(c, _)| c.clone())
            .collect()
    }
}

/// A full table snapshot: name, canonical column order, and rows.
#[derive(Debug, Clone, PartialEq)]
pub struct TableData {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl TableData {
    pub fn new(name: impl Into<String>, columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    /// A zero-row table with the given columns.
    pub fn empty(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self::new(name, columns, Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}
