//! Remote spreadsheet adapter speaking the Sheets v4 `values:append` API.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pipette_core::model::CellValue;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::repository::{SheetHandle, StorageError, TabularStore};

const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com";
const DEFAULT_SHEET_NAME: &str = "Progress";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug)]
pub struct SheetsConfig {
    pub base_url: String,
    pub spreadsheet_id: String,
    pub token: String,
    pub sheet_name: String,
    pub timeout: Duration,
}

impl SheetsConfig {
    /// Reads `PIPETTE_SHEETS_TOKEN` and `PIPETTE_SPREADSHEET_ID`; returns
    /// `None` unless both are set and non-empty.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let token = env::var("PIPETTE_SHEETS_TOKEN").ok()?;
        let spreadsheet_id = env::var("PIPETTE_SPREADSHEET_ID").ok()?;
        if token.trim().is_empty() || spreadsheet_id.trim().is_empty() {
            return None;
        }
        let base_url =
            env::var("PIPETTE_SHEETS_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let sheet_name =
            env::var("PIPETTE_SHEET_NAME").unwrap_or_else(|_| DEFAULT_SHEET_NAME.into());
        Some(Self {
            base_url,
            spreadsheet_id,
            token,
            sheet_name,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        spreadsheet_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            spreadsheet_id: spreadsheet_id.into(),
            token: token.into(),
            sheet_name: DEFAULT_SHEET_NAME.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Credentialed client for one spreadsheet.
#[derive(Clone)]
pub struct SheetsClient {
    client: Client,
    config: Arc<SheetsConfig>,
}

impl SheetsClient {
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` if the HTTP client cannot be built.
    pub fn new(config: SheetsConfig) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    #[must_use]
    pub fn config(&self) -> &SheetsConfig {
        &self.config
    }

    /// `{base}/v4/spreadsheets/{id}` followed by `extra` path segments.
    fn endpoint(&self, extra: &[&str]) -> Result<Url, StorageError> {
        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| StorageError::Unavailable(format!("invalid base url: {e}")))?;
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                StorageError::Unavailable(format!(
                    "base url cannot carry a path: {}",
                    self.config.base_url
                ))
            })?;
            segments
                .pop_if_empty()
                .extend(["v4", "spreadsheets", self.config.spreadsheet_id.as_str()])
                .extend(extra);
        }
        Ok(url)
    }
}

fn status_error(status: StatusCode, sheet: &str) -> StorageError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            StorageError::Unauthorized(status.as_u16())
        }
        StatusCode::NOT_FOUND => StorageError::SheetNotFound(sheet.to_string()),
        other => StorageError::Unavailable(format!("status {other}")),
    }
}

fn transport_error(e: &reqwest::Error) -> StorageError {
    StorageError::Unavailable(e.to_string())
}

#[async_trait]
impl TabularStore for SheetsClient {
    async fn open_sheet(&self, name: &str) -> Result<Arc<dyn SheetHandle>, StorageError> {
        let mut url = self.endpoint(&[])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties.title");

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.config.token)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        if !response.status().is_success() {
            return Err(status_error(response.status(), name));
        }

        let body: SpreadsheetResponse = response
            .json()
            .await
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        if !body.sheets.iter().any(|s| s.properties.title == name) {
            return Err(StorageError::SheetNotFound(name.to_string()));
        }

        Ok(Arc::new(RemoteSheet {
            client: self.clone(),
            name: name.to_string(),
        }))
    }
}

struct RemoteSheet {
    client: SheetsClient,
    name: String,
}

#[async_trait]
impl SheetHandle for RemoteSheet {
    fn name(&self) -> &str {
        &self.name
    }

    async fn append_row(&self, values: &[CellValue]) -> Result<(), StorageError> {
        let range = format!("{}!A1:append", self.name);
        let mut url = self.client.endpoint(&["values", range.as_str()])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");

        let payload = AppendRequest {
            values: vec![values.to_vec()],
        };

        tracing::debug!(sheet = %self.name, cells = values.len(), "appending row to remote sheet");
        let response = self
            .client
            .client
            .post(url)
            .bearer_auth(&self.client.config.token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!(sheet = %self.name, %status, "remote append rejected");
            return Err(status_error(status, &self.name));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct AppendRequest {
    values: Vec<Vec<CellValue>>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetResponse {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}
