//! Error types for the tile store boundary.

use std::path::PathBuf;

use thiserror::Error;

use crate::coord::TileCoord;

/// Errors surfaced by a tile store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store file does not exist
    #[error("tile store not found: {0}")]
    NotFound(PathBuf),

    /// Store could not be opened read-write
    #[error("failed to open tile store: {0}")]
    Open(#[source] rusqlite::Error),

    /// Query or write failed
    #[error("store operation failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Requested tile is absent from the store
    #[error("tile not found: {0}")]
    TileNotFound(TileCoord),

    /// Metadata row is missing or malformed
    #[error("invalid metadata '{key}': {message}")]
    Metadata { key: &'static str, message: String },
}
