//! Error types for the edit pipeline.
//!
//! Errors are categorized by the boundary they crossed. The first error
//! on any tile aborts the whole run; there is no partial success.

use thiserror::Error;

use crate::codec::CodecError;
use crate::coord::TileCoord;
use crate::resolver::ResolveError;
use crate::store::StoreError;
use crate::transform::TransformError;

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Range resolution failed before any tile work started
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Store read, write or transaction failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A tile could not be decoded or re-encoded
    #[error("tile {coord}: {source}")]
    Codec {
        coord: TileCoord,
        #[source]
        source: CodecError,
    },

    /// The user transform failed on a tile
    #[error("tile {coord}: {source}")]
    Transform {
        coord: TileCoord,
        #[source]
        source: TransformError,
    },

    /// A worker task panicked or was torn down
    #[error("worker failed: {0}")]
    Worker(String),
}
