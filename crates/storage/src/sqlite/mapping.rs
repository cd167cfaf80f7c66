use pipette_core::model::CellValue;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn encode_cells(cells: &[CellValue]) -> Result<String, StorageError> {
    serde_json::to_string(cells).map_err(ser)
}

pub(crate) fn decode_cells(raw: &str) -> Result<Vec<CellValue>, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}
