//! Tile codec: blob to feature collections and back.
//!
//! `decode` turns a stored blob into a [`LayerSet`](crate::features::LayerSet)
//! in geographic coordinates; `encode` re-tiles a layer set for one tile
//! coordinate and produces the compressed blob to store. The round trip
//! is exercised together in the encode tests.

mod clip;
mod decode;
mod encode;
mod error;
mod vector_tile;

pub use decode::decode;
pub use encode::{encode, EncodeOptions, DEFAULT_BUFFER};
pub use error::CodecError;
pub use vector_tile::DEFAULT_EXTENT;
