use async_trait::async_trait;
use pipette_core::model::CellValue;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by store adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("sheet not found: {0}")]
    SheetNotFound(String),

    #[error("store rejected credentials (status {0})")]
    Unauthorized(u16),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StorageError {
    /// Network and credential failures, as opposed to bad data.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            StorageError::Unavailable(_)
                | StorageError::Unauthorized(_)
                | StorageError::SheetNotFound(_)
        )
    }
}

/// One worksheet inside a tabular store. Rows can only be appended.
#[async_trait]
pub trait SheetHandle: Send + Sync {
    fn name(&self) -> &str;

    /// Append `values` as a new last row.
    ///
    /// Identical rows are appended again; nothing is deduplicated.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the row cannot be written.
    async fn append_row(&self, values: &[CellValue]) -> Result<(), StorageError>;
}

/// Store contract: look up a sheet by name.
#[async_trait]
pub trait TabularStore: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::SheetNotFound` if the backend has no such sheet,
    /// or other errors if the backend cannot be reached.
    async fn open_sheet(&self, name: &str) -> Result<Arc<dyn SheetHandle>, StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

type Sheets = Arc<Mutex<BTreeMap<String, Vec<Vec<CellValue>>>>>;

/// Simple in-memory store for tests and offline demos.
///
/// Sheets are created the first time they are opened.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    sheets: Sheets,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every row appended to `name`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` if the lock is poisoned.
    pub fn rows(&self, name: &str) -> Result<Vec<Vec<CellValue>>, StorageError> {
        let guard = self
            .sheets
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(guard.get(name).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl TabularStore for InMemoryStore {
    async fn open_sheet(&self, name: &str) -> Result<Arc<dyn SheetHandle>, StorageError> {
        let mut guard = self
            .sheets
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        guard.entry(name.to_string()).or_default();
        Ok(Arc::new(InMemorySheet {
            name: name.to_string(),
            sheets: Arc::clone(&self.sheets),
        }))
    }
}

struct InMemorySheet {
    name: String,
    sheets: Sheets,
}

#[async_trait]
impl SheetHandle for InMemorySheet {
    fn name(&self) -> &str {
        &self.name
    }

    async fn append_row(&self, values: &[CellValue]) -> Result<(), StorageError> {
        let mut guard = self
            .sheets
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        guard
            .entry(self.name.clone())
            .or_default()
            .push(values.to_vec());
        Ok(())
    }
}

//
// ─── AGGREGATE ─────────────────────────────────────────────────────────────────
//

/// The configured store behind a trait object, for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub sheets: Arc<dyn TabularStore>,
}

impl Storage {
    #[must_use]
    pub fn from_store(store: Arc<dyn TabularStore>) -> Self {
        Self { sheets: store }
    }
}
