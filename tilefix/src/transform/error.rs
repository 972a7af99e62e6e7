//! Error types for the transform boundary.

use thiserror::Error;

use crate::features::GeoJsonError;

/// Errors surfaced while applying a user transform to one tile.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Transform process could not be spawned
    #[error("failed to start transform command '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading from or writing to the transform process failed
    #[error("transform i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// Transform process exited unsuccessfully
    #[error("transform command exited with {status}: {stderr}")]
    CommandFailed { status: String, stderr: String },

    /// Transform output was not valid layered GeoJSON
    #[error("transform produced invalid output: {0}")]
    InvalidOutput(#[from] GeoJsonError),

    /// Embedded transform reported a failure
    #[error("transform failed: {0}")]
    Failed(String),
}
