//! Tile store boundary.
//!
//! The pipeline consumes stores through [`TileStore`]; the bundled
//! implementation is [`MbtilesStore`]. The trait speaks XYZ tile
//! coordinates throughout; numbering-scheme conversion happens inside the
//! adapter, never in the core.

mod error;
mod mbtiles;

pub use error::StoreError;
pub use mbtiles::MbtilesStore;

use crate::coord::TileCoord;
use crate::dataset::DatasetInfo;

/// Read/write access to a tiled dataset.
///
/// A run brackets all writes in one transaction: `start_writing` before
/// the first tile, then exactly one of `stop_writing` (commit) or
/// `abort_writing` (rollback).
pub trait TileStore: Send + Sync {
    /// Reads the dataset metadata. Called once per run.
    fn info(&self) -> Result<DatasetInfo, StoreError>;

    /// Fetches one stored tile blob; `StoreError::TileNotFound` when absent.
    fn get_tile(&self, coord: TileCoord) -> Result<Vec<u8>, StoreError>;

    /// Overwrites one tile blob in place.
    fn put_tile(&self, coord: TileCoord, blob: &[u8]) -> Result<(), StoreError>;

    /// Opens the run-level write transaction.
    fn start_writing(&self) -> Result<(), StoreError>;

    /// Commits the run-level write transaction.
    fn stop_writing(&self) -> Result<(), StoreError>;

    /// Rolls the run-level write transaction back.
    fn abort_writing(&self) -> Result<(), StoreError>;
}
