use std::env;
use std::sync::Arc;

use storage::Storage;
use storage::sheets::{SheetsClient, SheetsConfig};

use crate::Clock;
use crate::error::AppServicesError;
use crate::sessions::WorksheetService;
use crate::submitter::ProgressSubmitter;

const DEFAULT_DB_URL: &str = "sqlite://pipette.sqlite3";
const DEFAULT_SHEET_NAME: &str = "Progress";

/// Where progress rows go.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    Sheets(SheetsConfig),
    Sqlite { url: String, sheet_name: String },
}

impl StoreBackend {
    /// Remote sheets when `PIPETTE_SHEETS_TOKEN` and `PIPETTE_SPREADSHEET_ID`
    /// are both set, otherwise `SQLite` at `PIPETTE_DB_URL`.
    #[must_use]
    pub fn from_env() -> Self {
        if let Some(config) = SheetsConfig::from_env() {
            return Self::Sheets(config);
        }
        Self::Sqlite {
            url: env::var("PIPETTE_DB_URL").unwrap_or_else(|_| DEFAULT_DB_URL.into()),
            sheet_name: env::var("PIPETTE_SHEET_NAME")
                .unwrap_or_else(|_| DEFAULT_SHEET_NAME.into()),
        }
    }

    #[must_use]
    pub fn sheet_name(&self) -> &str {
        match self {
            Self::Sheets(config) => &config.sheet_name,
            Self::Sqlite { sheet_name, .. } => sheet_name,
        }
    }
}

/// Assembles app-facing services around the configured store.
#[derive(Clone)]
pub struct AppServices {
    storage: Storage,
    worksheets: Arc<WorksheetService>,
}

impl AppServices {
    /// # Errors
    ///
    /// Returns `AppServicesError` if the store cannot be initialized.
    pub async fn new(backend: StoreBackend, clock: Clock) -> Result<Self, AppServicesError> {
        let sheet_name = backend.sheet_name().to_string();
        let storage = match backend {
            StoreBackend::Sheets(config) => {
                tracing::info!(spreadsheet = %config.spreadsheet_id, "using remote progress sheet");
                Storage::from_store(Arc::new(SheetsClient::new(config)?))
            }
            StoreBackend::Sqlite { url, .. } => {
                tracing::info!(%url, "using local progress database");
                Storage::sqlite(&url).await?
            }
        };
        Ok(Self::from_storage(storage, sheet_name, clock))
    }

    /// # Errors
    ///
    /// Returns `AppServicesError` if the store cannot be initialized.
    pub async fn from_env(clock: Clock) -> Result<Self, AppServicesError> {
        Self::new(StoreBackend::from_env(), clock).await
    }

    #[must_use]
    pub fn from_storage(storage: Storage, sheet_name: impl Into<String>, clock: Clock) -> Self {
        let submitter = ProgressSubmitter::new(Arc::clone(&storage.sheets), sheet_name);
        Self {
            storage,
            worksheets: Arc::new(WorksheetService::new(clock, submitter)),
        }
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[must_use]
    pub fn worksheets(&self) -> Arc<WorksheetService> {
        Arc::clone(&self.worksheets)
    }
}
