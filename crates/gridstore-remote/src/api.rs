use gridstore_core::StoreError;
use reqwest::{Client as HttpClient, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Worksheet REST API client.
///
/// Holds the authorized handle for one remote resource: base URL, opaque
/// resource identifier, and a bearer token. Every call is one HTTP request;
/// quota rejections surface as [`StoreError::RateLimited`] so the caller's
/// retry policy can classify them.
pub struct ApiClient {
    http_client: HttpClient,
    base_url: String,
    resource_id: String,
    api_token: String,
}

#[derive(Debug, Deserialize)]
struct WorksheetList {
    worksheets: Vec<String>,
}

#[derive(Debug, Serialize)]
struct CreateWorksheet<'a> {
    title: &'a str,
}

#[derive(Debug, Serialize, Deserialize)]
struct ValueGrid {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

impl ApiClient {
    /// Create a client for one remote resource.
    pub fn new(
        base_url: impl Into<String>,
        resource_id: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            resource_id: resource_id.into(),
            api_token: api_token.into(),
        }
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    fn worksheets_url(&self) -> String {
        format!(
            "{}/resources/{}/worksheets",
            self.base_url, self.resource_id
        )
    }

    fn values_url(&self, worksheet: &str, suffix: &str) -> String {
        format!(
            "{}/{}/values{}",
            self.worksheets_url(),
            urlencoding::encode(worksheet),
            suffix
        )
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.api_token)
    }

    /// Map a non-success response to the error taxonomy.
    async fn classify(context: &str, response: Response) -> StoreError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                StoreError::RateLimited(format!("{}: {}", context, body))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                StoreError::Unauthorized(format!("{} failed with {}: {}", context, status, body))
            }
            StatusCode::NOT_FOUND => StoreError::NotFound(context.to_string()),
            _ => StoreError::Remote(format!("{} failed with {}: {}", context, status, body)),
        }
    }

    /// List the resource's worksheet titles.
    #[instrument(skip(self), level = "debug")]
    pub async fn list_worksheets(&self) -> Result<Vec<String>, StoreError> {
        let response = self
            .http_client
            .get(self.worksheets_url())
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| StoreError::Remote(format!("list worksheets request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::classify("list worksheets", response).await);
        }

        let list: WorksheetList = response
            .json()
            .await
            .map_err(|e| StoreError::Serialization(format!("bad worksheet list: {}", e)))?;
        debug!("Listed {} worksheets", list.worksheets.len());
        Ok(list.worksheets)
    }

    /// Create an empty worksheet.
    #[instrument(skip(self), level = "debug")]
    pub async fn create_worksheet(&self, title: &str) -> Result<(), StoreError> {
        let response = self
            .http_client
            .post(self.worksheets_url())
            .header("Authorization", self.auth_header())
            .json(&CreateWorksheet { title })
            .send()
            .await
            .map_err(|e| StoreError::Remote(format!("create worksheet request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::classify("create worksheet", response).await);
        }
        debug!("Created worksheet {}", title);
        Ok(())
    }

    /// Fetch the full grid (header row first). `None` when the worksheet
    /// does not exist.
    #[instrument(skip(self), level = "debug")]
    pub async fn get_values(&self, worksheet: &str) -> Result<Option<Vec<Vec<String>>>, StoreError> {
        let response = self
            .http_client
            .get(self.values_url(worksheet, ""))
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| StoreError::Remote(format!("get values request failed: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("Worksheet {} not found", worksheet);
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::classify("get values", response).await);
        }

        let grid: ValueGrid = response
            .json()
            .await
            .map_err(|e| StoreError::Serialization(format!("bad value grid: {}", e)))?;
        debug!("Fetched {} rows from {}", grid.values.len(), worksheet);
        Ok(Some(grid.values))
    }

    /// Append one row of cells below the current data.
    #[instrument(skip(self, cells), level = "debug", fields(cells = cells.len()))]
    pub async fn append_values(
        &self,
        worksheet: &str,
        cells: Vec<String>,
    ) -> Result<(), StoreError> {
        let response = self
            .http_client
            .post(self.values_url(worksheet, ":append"))
            .header("Authorization", self.auth_header())
            .json(&ValueGrid {
                values: vec![cells],
            })
            .send()
            .await
            .map_err(|e| StoreError::Remote(format!("append request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::classify("append values", response).await);
        }
        debug!("Appended one row to {}", worksheet);
        Ok(())
    }

    /// Drop every cell in the worksheet, header included.
    #[instrument(skip(self), level = "debug")]
    pub async fn clear_values(&self, worksheet: &str) -> Result<(), StoreError> {
        let response = self
            .http_client
            .post(self.values_url(worksheet, ":clear"))
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| StoreError::Remote(format!("clear request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::classify("clear values", response).await);
        }
        debug!("Cleared worksheet {}", worksheet);
        Ok(())
    }

    /// Write the full grid (header row first), replacing current content.
    #[instrument(skip(self, values), level = "debug", fields(rows = values.len()))]
    pub async fn put_values(
        &self,
        worksheet: &str,
        values: Vec<Vec<String>>,
    ) -> Result<(), StoreError> {
        let count = values.len();
        let response = self
            .http_client
            .put(self.values_url(worksheet, ""))
            .header("Authorization", self.auth_header())
            .json(&ValueGrid { values })
            .send()
            .await
            .map_err(|e| StoreError::Remote(format!("put values request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::classify("put values", response).await);
        }
        debug!("Wrote {} rows to {}", count, worksheet);
        Ok(())
    }
}
