#![forbid(unsafe_code)]

pub mod repository;
pub mod sheets;
pub mod sqlite;

pub use repository::{InMemoryStore, SheetHandle, Storage, StorageError, TabularStore};
