//! User transform boundary.
//!
//! A [`TileTransform`] receives the decoded layers of one tile and
//! returns either a replacement layer set or `None` to leave the tile
//! untouched. The bundled implementation shells out to an external
//! program per tile ([`CommandTransform`]); [`FnTransform`] adapts a
//! closure, mainly for tests and embedding.

mod command;
mod error;

pub use command::CommandTransform;
pub use error::TransformError;

use std::future::Future;
use std::pin::Pin;

use crate::coord::TileCoord;
use crate::features::LayerSet;

/// Per-tile editing hook.
///
/// `Ok(None)` means "no change": the pipeline skips re-encoding and the
/// stored tile is left byte-identical. Any error aborts the run.
pub trait TileTransform: Send + Sync {
    fn apply<'a>(
        &'a self,
        coord: TileCoord,
        layers: LayerSet,
    ) -> Pin<Box<dyn Future<Output = Result<Option<LayerSet>, TransformError>> + Send + 'a>>;
}

/// Adapts a synchronous closure into a [`TileTransform`].
pub struct FnTransform<F>(F);

impl<F> FnTransform<F>
where
    F: Fn(TileCoord, LayerSet) -> Result<Option<LayerSet>, TransformError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> TileTransform for FnTransform<F>
where
    F: Fn(TileCoord, LayerSet) -> Result<Option<LayerSet>, TransformError> + Send + Sync,
{
    fn apply<'a>(
        &'a self,
        coord: TileCoord,
        layers: LayerSet,
    ) -> Pin<Box<dyn Future<Output = Result<Option<LayerSet>, TransformError>> + Send + 'a>> {
        let result = (self.0)(coord, layers);
        Box::pin(async move { result })
    }
}
