//! Error types for the tile codec.

use thiserror::Error;

/// Errors raised while decoding or encoding a tile blob.
///
/// Every codec error is fatal for the whole run; skipping a tile would
/// leave the dataset partially edited with no record of the gap.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Gzip envelope could not be decompressed
    #[error("tile decompression failed: {0}")]
    Decompress(#[source] std::io::Error),

    /// Gzip envelope could not be written
    #[error("tile compression failed: {0}")]
    Compress(#[source] std::io::Error),

    /// Protobuf structure is malformed
    #[error("malformed vector tile: {0}")]
    Protobuf(#[from] prost::DecodeError),

    /// Geometry command stream is malformed
    #[error("malformed geometry: {0}")]
    Geometry(String),

    /// Tile serialization failed
    #[error("tile encoding failed: {0}")]
    Encode(String),
}

impl From<mvt::Error> for CodecError {
    fn from(err: mvt::Error) -> Self {
        CodecError::Encode(err.to_string())
    }
}
