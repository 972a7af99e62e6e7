//! Tile range resolution.
//!
//! Turns a requested zoom range and bounding box into the concrete set of
//! tile coordinates a run will visit. Requests are trimmed to what the
//! dataset actually declares rather than rejected; every adjustment is
//! logged so a run over a small dataset with world defaults stays quiet
//! about tiles that cannot exist.

use thiserror::Error;
use tracing::debug;

use crate::coord::{
    self, clamp_mercator_lat, expand_range, GeoBounds, TileCoord, ZoomRange,
};
use crate::dataset::DatasetInfo;

/// Resolution failures. All are preconditions checked before any tile work.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Dataset does not hold protobuf vector tiles
    #[error("unsupported tile format '{0}': only pbf datasets can be edited")]
    UnsupportedFormat(String),
}

/// Tile index spans for one zoom level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelRange {
    pub zoom: u8,
    /// Columns covered, ascending and inclusive
    pub columns: Vec<u32>,
    /// Rows covered, ascending and inclusive
    pub rows: Vec<u32>,
}

/// The fully resolved job set for a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRange {
    /// Zoom range after clamping to the dataset
    pub zoom: ZoomRange,
    /// Bounding box after clamping to the dataset
    pub bbox: GeoBounds,
    pub levels: Vec<LevelRange>,
}

impl ResolvedRange {
    /// Number of tiles the range covers, computable before any tile is
    /// touched.
    pub fn tile_count(&self) -> u64 {
        self.levels
            .iter()
            .map(|level| level.columns.len() as u64 * level.rows.len() as u64)
            .sum()
    }

    /// Yields every tile coordinate in deterministic order: zoom
    /// ascending, then column, then row.
    pub fn coords(&self) -> impl Iterator<Item = TileCoord> + '_ {
        self.levels.iter().flat_map(|level| {
            level.columns.iter().flat_map(move |&column| {
                level
                    .rows
                    .iter()
                    .map(move |&row| TileCoord::new(level.zoom, column, row))
            })
        })
    }
}

/// Resolves a requested zoom range and bounding box against a dataset.
///
/// The request is clamped per-axis to the dataset's declared zoom bounds
/// and bounding box, latitudes additionally to the Web Mercator range.
/// An empty job set is a valid result.
///
/// # Errors
///
/// Returns [`ResolveError::UnsupportedFormat`] when the dataset is not a
/// protobuf vector tileset.
pub fn resolve(
    info: &DatasetInfo,
    requested_zoom: ZoomRange,
    requested_bbox: GeoBounds,
) -> Result<ResolvedRange, ResolveError> {
    if !info.format.is_vector() {
        return Err(ResolveError::UnsupportedFormat(info.format.to_string()));
    }

    let zoom = requested_zoom.clamp_to(info.minzoom, info.maxzoom);
    if zoom != requested_zoom {
        debug!(requested = %requested_zoom, effective = %zoom, "zoom range clamped to dataset");
    }

    let bbox = requested_bbox.clamp_to(&info.bounds);
    if bbox != requested_bbox {
        debug!(
            requested = ?requested_bbox,
            effective = ?bbox,
            "bounding box clamped to dataset"
        );
    }

    let north = clamp_mercator_lat(bbox.max_lat);
    let south = clamp_mercator_lat(bbox.min_lat);

    let levels = expand_range(u32::from(zoom.min), u32::from(zoom.max))
        .into_iter()
        .map(|z| {
            let z = z as u8;
            LevelRange {
                zoom: z,
                columns: expand_range(
                    coord::tile_column(bbox.min_lon, z),
                    coord::tile_column(bbox.max_lon, z),
                ),
                rows: expand_range(coord::tile_row(north, z), coord::tile_row(south, z)),
            }
        })
        .collect();

    Ok(ResolvedRange { zoom, bbox, levels })
}
