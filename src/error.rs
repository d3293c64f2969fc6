// ⚠️ Error types for the expense store
//
// The store lets backend and serialization failures propagate; callers
// decide how to present them. No-op updates/deletes are not errors.

use thiserror::Error;

/// Unified error type for the library
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite backend failure
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Non-SQLite backend failure (e.g. a poisoned in-memory store)
    #[error("storage backend error: {0}")]
    Backend(String),

    /// JSON encode/decode failure outside of the lenient `load` path
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV writer failure
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Imported data is not a JSON array of expenses
    #[error("invalid import data: {0}")]
    InvalidImport(String),

    /// Input rejected at the boundary before reaching the store
    #[error("{0}")]
    Validation(String),
}

impl StoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        StoreError::Validation(message.into())
    }

    pub fn invalid_import(message: impl Into<String>) -> Self {
        StoreError::InvalidImport(message.into())
    }

    /// True for errors caused by caller input rather than the backend
    pub fn is_user_error(&self) -> bool {
        matches!(self, StoreError::Validation(_) | StoreError::InvalidImport(_))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
