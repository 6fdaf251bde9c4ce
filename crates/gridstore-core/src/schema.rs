use crate::row::TableData;

/// Static mapping of table name to declared column order.
///
/// Backends use the registry in two ways: `ensure_tables` materializes every
/// declared table, and reads of an absent table return
/// [`SchemaRegistry::empty_table`] so callers never see a "table missing"
/// error. Declaration order is preserved.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    tables: Vec<(String, Vec<String>)>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a table. Re-declaring a name replaces its column list.
    pub fn declare(&mut self, name: impl Into<String>, columns: &[&str]) {
        let name = name.into();
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        match self.tables.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = columns,
            None => self.tables.push((name, columns)),
        }
    }

    /// Builder-style [`SchemaRegistry::declare`].
    pub fn with_table(mut self, name: impl Into<String>, columns: &[&str]) -> Self {
        self.declare(name, columns);
        self
    }

    /// Declared column order for a table, if it is known to the registry.
    pub fn columns_for(&self, name: &str) -> Option<&[String]> {
        self.tables
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c.as_slice())
    }

    /// The schema-shaped empty result for a table: zero rows with the
    /// declared columns, or no columns at all when the name is undeclared.
    pub fn empty_table(&self, name: &str) -> TableData {
        let columns = self
            .columns_for(name)
            .map(|c| c.to_vec())
            .unwrap_or_default();
        TableData::empty(name, columns)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.tables.iter().map(|(n, c)| (n.as_str(), c.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_empty_table_has_columns() {
        let registry = SchemaRegistry::new().with_table("Items", &["id", "name", "qty"]);
        let table = registry.empty_table("Items");
        assert_eq!(table.columns, vec!["id", "name", "qty"]);
        assert!(table.rows.is_empty());
    }

    #[test]
    fn test_undeclared_empty_table_has_no_columns() {
        let registry = SchemaRegistry::new();
        let table = registry.empty_table("Nonexistent");
        assert!(table.columns.is_empty());
        assert!(table.rows.is_empty());
    }

    #[test]
    fn test_redeclare_replaces_columns() {
        let registry = SchemaRegistry::new()
            .with_table("Items", &["id"])
            .with_table("Items", &["id", "qty"]);
        assert_eq!(
            registry.columns_for("Items").unwrap(),
            &["id".to_string(), "qty".to_string()]
        );
        assert_eq!(registry.iter().count(), 1);
    }
}
