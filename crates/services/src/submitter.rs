use std::sync::Arc;

use pipette_core::model::{ProgressRecord, ProgressRecordBuilder};
use storage::TabularStore;

use crate::error::SubmitError;

/// Appends finished progress records to one sheet of the configured store.
///
/// Every successful call adds exactly one row. Nothing is deduplicated,
/// retried or queued: if the store is unreachable the caller gets
/// `SubmitError::StoreUnavailable` and decides what to do.
#[derive(Clone)]
pub struct ProgressSubmitter {
    store: Arc<dyn TabularStore>,
    sheet_name: String,
}

impl ProgressSubmitter {
    #[must_use]
    pub fn new(store: Arc<dyn TabularStore>, sheet_name: impl Into<String>) -> Self {
        Self {
            store,
            sheet_name: sheet_name.into(),
        }
    }

    #[must_use]
    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    /// Check a draft for completeness, then append it.
    ///
    /// # Errors
    ///
    /// Returns `SubmitError::MissingData` before touching the store if any
    /// required field is absent, or `SubmitError::StoreUnavailable` if the
    /// append fails.
    pub async fn submit(
        &self,
        draft: ProgressRecordBuilder,
    ) -> Result<ProgressRecord, SubmitError> {
        let record = draft.build()?;
        self.append(&record).await?;
        Ok(record)
    }

    /// Append an already-built record.
    ///
    /// # Errors
    ///
    /// Returns `SubmitError::StoreUnavailable` if the sheet cannot be opened
    /// or the row cannot be written.
    pub async fn append(&self, record: &ProgressRecord) -> Result<(), SubmitError> {
        tracing::debug!(sheet = %self.sheet_name, "appending progress record");
        let result = match self.store.open_sheet(&self.sheet_name).await {
            Ok(sheet) => sheet.append_row(record.values()).await,
            Err(err) => Err(err),
        };
        match result {
            Ok(()) => {
                tracing::info!(sheet = %self.sheet_name, "progress record appended");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(sheet = %self.sheet_name, error = %err, "progress append failed");
                Err(err.into())
            }
        }
    }
}
