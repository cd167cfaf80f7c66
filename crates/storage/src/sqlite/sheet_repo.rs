use std::sync::Arc;

use chrono::{DateTime, Utc};
use pipette_core::model::CellValue;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{decode_cells, encode_cells, ser};
use crate::repository::{SheetHandle, StorageError, TabularStore};

/// A row read back from the `sheet_rows` table.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRow {
    pub id: i64,
    pub cells: Vec<CellValue>,
    pub appended_at: DateTime<Utc>,
}

impl SqliteRepository {
    /// Rows of `sheet` in append order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails or a stored row is corrupt.
    pub async fn list_rows(&self, sheet: &str) -> Result<Vec<StoredRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, cells, appended_at
                FROM sheet_rows
                WHERE sheet = ?1
                ORDER BY id ASC
            ",
        )
        .bind(sheet)
        .fetch_all(self.pool())
        .await
        .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let cells: String = row.try_get("cells").map_err(ser)?;
            out.push(StoredRow {
                id: row.try_get("id").map_err(ser)?,
                cells: decode_cells(&cells)?,
                appended_at: row.try_get("appended_at").map_err(ser)?,
            });
        }
        Ok(out)
    }
}

#[async_trait::async_trait]
impl TabularStore for SqliteRepository {
    /// Local sheets are created implicitly by their first append.
    async fn open_sheet(&self, name: &str) -> Result<Arc<dyn SheetHandle>, StorageError> {
        if name.trim().is_empty() {
            return Err(StorageError::SheetNotFound(name.to_string()));
        }
        Ok(Arc::new(SqliteSheet {
            repo: self.clone(),
            name: name.to_string(),
        }))
    }
}

struct SqliteSheet {
    repo: SqliteRepository,
    name: String,
}

#[async_trait::async_trait]
impl SheetHandle for SqliteSheet {
    fn name(&self) -> &str {
        &self.name
    }

    async fn append_row(&self, values: &[CellValue]) -> Result<(), StorageError> {
        let cells = encode_cells(values)?;
        let res = sqlx::query(
            r"
                INSERT INTO sheet_rows (sheet, cells, appended_at)
                VALUES (?1, ?2, ?3)
            ",
        )
        .bind(&self.name)
        .bind(cells)
        .bind(self.repo.clock.now())
        .execute(self.repo.pool())
        .await
        .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        tracing::debug!(
            sheet = %self.name,
            row_id = res.last_insert_rowid(),
            "appended row"
        );
        Ok(())
    }
}
