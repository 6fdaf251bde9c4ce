use std::sync::Arc;

use async_trait::async_trait;
use gridstore_core::{
    Row, RowPredicate, RowTransform, SchemaRegistry, StoreError, TableData, TableStore, Value,
};
use tracing::{debug, instrument, warn};

use crate::api::ApiClient;

/// Remote worksheet storage backend.
///
/// One worksheet per table, one API call per primitive. The medium has no
/// partial-update operation, so `replace_table` and `update_rows` rewrite
/// the whole worksheet (clear, then header + all rows). There is no version
/// token on those rewrites: two concurrent writers produce last-writer-wins
/// results, silently discarding the loser's changes. This backend is meant
/// for single-operator, human-paced usage, not concurrent writers.
pub struct RemoteTableStore {
    client: ApiClient,
    registry: Arc<SchemaRegistry>,
}

impl RemoteTableStore {
    /// Create a backend over an authorized [`ApiClient`].
    pub fn new(client: ApiClient, registry: Arc<SchemaRegistry>) -> Self {
        Self { client, registry }
    }

    fn grid_for(columns: &[String], rows: &[Row]) -> Vec<Vec<String>> {
        let mut grid = Vec::with_capacity(rows.len() + 1);
        grid.push(columns.to_vec());
        for row in rows {
            grid.push(
                row.values_in(columns)
                    .iter()
                    .map(Value::to_cell_text)
                    .collect(),
            );
        }
        grid
    }

    fn table_from_grid(name: &str, grid: Vec<Vec<String>>) -> Option<TableData> {
        let mut grid = grid.into_iter();
        let columns = grid.next()?;
        let rows = grid
            .map(|cells| {
                Row::from_cells(
                    &columns,
                    cells.iter().map(|c| Value::from_cell_text(c)).collect(),
                )
            })
            .collect();
        Some(TableData::new(name, columns, rows))
    }
}

#[async_trait]
impl TableStore for RemoteTableStore {
    fn backend_name(&self) -> &'static str {
        "remote"
    }

    #[instrument(skip(self, registry), level = "debug")]
    async fn ensure_tables(&self, registry: &SchemaRegistry) -> Result<(), StoreError> {
        let existing = self.client.list_worksheets().await?;

        for (name, columns) in registry.iter() {
            if existing.iter().any(|w| w == name) {
                let header = self
                    .client
                    .get_values(name)
                    .await?
                    .and_then(|grid| grid.into_iter().next())
                    .unwrap_or_default();
                if header != columns {
                    warn!(
                        "Worksheet {} header mismatch: declared {:?}, found {:?}",
                        name, columns, header
                    );
                }
            } else {
                self.client.create_worksheet(name).await?;
                self.client
                    .put_values(name, vec![columns.to_vec()])
                    .await?;
                debug!("Created worksheet {} with {} columns", name, columns.len());
            }
        }
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn read_table(&self, name: &str) -> Result<TableData, StoreError> {
        match self.client.get_values(name).await? {
            Some(grid) => match Self::table_from_grid(name, grid) {
                Some(table) => {
                    debug!("Read table {} ({} rows)", name, table.rows.len());
                    Ok(table)
                }
                // Worksheet exists but carries no header yet.
                None => Ok(self.registry.empty_table(name)),
            },
            None => {
                debug!("Worksheet {} absent, returning declared schema", name);
                Ok(self.registry.empty_table(name))
            }
        }
    }

    #[instrument(skip(self, row), level = "debug")]
    async fn append_row(&self, name: &str, row: &Row) -> Result<(), StoreError> {
        // The live header row is the canonical column order.
        let grid = self.client.get_values(name).await?;
        let header = grid.as_ref().and_then(|g| g.first().cloned());

        let columns = match header {
            Some(columns) if !columns.is_empty() => columns,
            // Lazy creation, mirroring the local backend: declared columns,
            // or the row's own order when undeclared.
            _ => {
                let columns = self
                    .registry
                    .columns_for(name)
                    .map(|c| c.to_vec())
                    .unwrap_or_else(|| row.columns().map(String::from).collect());
                if grid.is_none() {
                    self.client.create_worksheet(name).await?;
                }
                self.client.put_values(name, vec![columns.clone()]).await?;
                columns
            }
        };

        let unknown = row.unknown_columns(&columns);
        if !unknown.is_empty() {
            return Err(StoreError::InvalidArgument(format!(
                "row for table {} has unknown columns: {}",
                name,
                unknown.join(", ")
            )));
        }

        let cells = row
            .values_in(&columns)
            .iter()
            .map(Value::to_cell_text)
            .collect();
        self.client.append_values(name, cells).await?;
        debug!("Appended one row to worksheet {}", name);
        Ok(())
    }

    #[instrument(skip(self, rows), level = "debug", fields(rows = rows.len()))]
    async fn replace_table(
        &self,
        name: &str,
        columns: &[String],
        rows: Vec<Row>,
    ) -> Result<(), StoreError> {
        match self.client.clear_values(name).await {
            Ok(()) => {}
            Err(StoreError::NotFound(_)) => {
                self.client.create_worksheet(name).await?;
            }
            Err(e) => return Err(e),
        }

        let count = rows.len();
        self.client
            .put_values(name, Self::grid_for(columns, &rows))
            .await?;
        debug!("Replaced worksheet {} with {} rows", name, count);
        Ok(())
    }

    #[instrument(skip(self, predicate, transform), level = "debug")]
    async fn update_rows(
        &self,
        name: &str,
        predicate: RowPredicate<'_>,
        transform: RowTransform<'_>,
    ) -> Result<u64, StoreError> {
        let table = self.read_table(name).await?;

        let mut matched = 0u64;
        let mut rows = Vec::with_capacity(table.rows.len());
        for row in &table.rows {
            if predicate(row) {
                matched += 1;
                rows.push(transform(row));
            } else {
                rows.push(row.clone());
            }
        }

        if matched == 0 {
            debug!("Update on worksheet {} matched no rows", name);
            return Ok(0);
        }

        // Full rewrite; a concurrent writer's changes between our read and
        // this replace are silently lost (last-writer-wins).
        self.replace_table(name, &table.columns, rows).await?;
        debug!("Updated {} rows in worksheet {}", matched, name);
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new().with_table("Items", &["id", "name", "qty"])
    }

    async fn setup() -> (MockServer, RemoteTableStore) {
        let server = MockServer::start().await;
        let client = ApiClient::new(server.uri(), "sheet-1", "test-token");
        let store = RemoteTableStore::new(client, Arc::new(registry()));
        (server, store)
    }

    #[tokio::test]
    async fn test_read_table_parses_and_coerces() {
        let (server, store) = setup().await;
        Mock::given(method("GET"))
            .and(path("/resources/sheet-1/worksheets/Items/values"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "values": [
                    ["id", "name", "qty"],
                    ["1", "Widget", "5"],
                    ["2", "Gadget", ""],
                ]
            })))
            .mount(&server)
            .await;

        let table = store.read_table("Items").await.unwrap();
        assert_eq!(table.columns, vec!["id", "name", "qty"]);
        assert_eq!(table.rows.len(), 2);
        // Text on the wire comes back as its semantic type.
        assert_eq!(table.rows[0].get("qty"), Some(&Value::Number(5.0)));
        assert_eq!(table.rows[0].get("name"), Some(&Value::Text("Widget".into())));
        assert_eq!(table.rows[1].get("qty"), Some(&Value::Null));
    }

    #[tokio::test]
    async fn test_read_missing_worksheet_returns_declared_empty() {
        let (server, store) = setup().await;
        Mock::given(method("GET"))
            .and(path("/resources/sheet-1/worksheets/Items/values"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let table = store.read_table("Items").await.unwrap();
        assert_eq!(table.columns, vec!["id", "name", "qty"]);
        assert!(table.rows.is_empty());
    }

    #[tokio::test]
    async fn test_append_uses_live_header_order() {
        let (server, store) = setup().await;
        Mock::given(method("GET"))
            .and(path("/resources/sheet-1/worksheets/Items/values"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "values": [["id", "name", "qty"]]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/resources/sheet-1/worksheets/Items/values:append"))
            .and(body_json(json!({"values": [["2", "Gadget", "3"]]})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        // Row deliberately out of header order; the append must realign it.
        let row = Row::new()
            .with("qty", 3i64)
            .with("id", "2")
            .with("name", "Gadget");
        store.append_row("Items", &row).await.unwrap();
    }

    #[tokio::test]
    async fn test_append_unknown_column_rejected() {
        let (server, store) = setup().await;
        Mock::given(method("GET"))
            .and(path("/resources/sheet-1/worksheets/Items/values"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "values": [["id", "name", "qty"]]
            })))
            .mount(&server)
            .await;

        let row = Row::new().with("id", "1").with("bogus", "x");
        let err = store.append_row("Items", &row).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_replace_clears_then_writes_full_grid() {
        let (server, store) = setup().await;
        Mock::given(method("POST"))
            .and(path("/resources/sheet-1/worksheets/Items/values:clear"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/resources/sheet-1/worksheets/Items/values"))
            .and(body_json(json!({
                "values": [["id", "name", "qty"], ["1", "Widget", "5"]]
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let columns: Vec<String> = vec!["id".into(), "name".into(), "qty".into()];
        let rows = vec![Row::new().with("id", "1").with("name", "Widget").with("qty", 5i64)];
        store.replace_table("Items", &columns, rows).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_rewrites_whole_worksheet() {
        let (server, store) = setup().await;
        Mock::given(method("GET"))
            .and(path("/resources/sheet-1/worksheets/Items/values"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "values": [
                    ["id", "name", "qty"],
                    ["1", "Widget", "5"],
                    ["2", "Gadget", "7"],
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/resources/sheet-1/worksheets/Items/values:clear"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/resources/sheet-1/worksheets/Items/values"))
            .and(body_json(json!({
                "values": [
                    ["id", "name", "qty"],
                    ["1", "Widget", "10"],
                    ["2", "Gadget", "7"],
                ]
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let matched = store
            .update_rows(
                "Items",
                &|r| r.get("id") == Some(&Value::Number(1.0)),
                &|r| r.clone().with("qty", "10"),
            )
            .await
            .unwrap();
        assert_eq!(matched, 1);
    }

    #[tokio::test]
    async fn test_zero_match_update_issues_no_write() {
        let (server, store) = setup().await;
        Mock::given(method("GET"))
            .and(path("/resources/sheet-1/worksheets/Items/values"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "values": [["id", "name", "qty"], ["1", "Widget", "5"]]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/resources/sheet-1/worksheets/Items/values:clear"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let matched = store
            .update_rows("Items", &|_| false, &|r| r.clone())
            .await
            .unwrap();
        assert_eq!(matched, 0);
    }

    #[tokio::test]
    async fn test_rate_limit_maps_to_transient_error() {
        let (server, store) = setup().await;
        Mock::given(method("GET"))
            .and(path("/resources/sheet-1/worksheets/Items/values"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let err = store.read_table("Items").await.unwrap_err();
        assert!(err.is_rate_limited());
    }

    #[tokio::test]
    async fn test_write_auth_failure_propagates() {
        let (server, store) = setup().await;
        Mock::given(method("GET"))
            .and(path("/resources/sheet-1/worksheets/Items/values"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "values": [["id", "name", "qty"]]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/resources/sheet-1/worksheets/Items/values:append"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let row = Row::new().with("id", "1");
        let err = store.append_row("Items", &row).await.unwrap_err();
        assert!(matches!(err, StoreError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_ensure_creates_missing_worksheets_only() {
        let (server, store) = setup().await;
        let declared = SchemaRegistry::new()
            .with_table("Items", &["id", "name", "qty"])
            .with_table("Orders", &["order_id", "total"]);

        Mock::given(method("GET"))
            .and(path("/resources/sheet-1/worksheets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "worksheets": ["Items"]
            })))
            .mount(&server)
            .await;
        // Existing worksheet: only a header check.
        Mock::given(method("GET"))
            .and(path("/resources/sheet-1/worksheets/Items/values"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "values": [["id", "name", "qty"]]
            })))
            .expect(1)
            .mount(&server)
            .await;
        // Missing worksheet: created, then seeded with its header row.
        Mock::given(method("POST"))
            .and(path("/resources/sheet-1/worksheets"))
            .and(body_json(json!({"title": "Orders"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/resources/sheet-1/worksheets/Orders/values"))
            .and(body_json(json!({"values": [["order_id", "total"]]})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        store.ensure_tables(&declared).await.unwrap();
    }
}
