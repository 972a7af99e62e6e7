//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (longitude/latitude)
//! and Web Mercator tile indices, plus the integer range expansion used to
//! enumerate zoom levels and tile index spans.

mod types;

pub use types::{
    CoordError, GeoBounds, TileCoord, ZoomRange, MAX_LAT, MAX_LON, MAX_ZOOM, MERC_MAX_LAT,
    MERC_MIN_LAT, MIN_LAT, MIN_LON, MIN_ZOOM, WORLD_BOUNDS,
};

use std::f64::consts::PI;

/// Converts a longitude to the tile column at a zoom level.
///
/// The result is clamped to `[0, 2^zoom - 1]` so the +180 edge lands on
/// the last column rather than one past it.
#[inline]
pub fn tile_column(lon: f64, zoom: u8) -> u32 {
    let n = 2.0_f64.powi(zoom as i32);
    let col = ((lon + 180.0) / 360.0 * n).floor();
    clamp_index(col, zoom)
}

/// Converts a latitude to the tile row at a zoom level.
///
/// Uses the standard Web Mercator row formula. Latitudes at or beyond the
/// projection limit (±85.05112878) must be clamped by the caller first;
/// the result is still clamped to `[0, 2^zoom - 1]` as a safety net for
/// values numerically at the limit.
#[inline]
pub fn tile_row(lat: f64, zoom: u8) -> u32 {
    let n = 2.0_f64.powi(zoom as i32);
    let lat_rad = lat * PI / 180.0;
    let row = ((1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n).floor();
    clamp_index(row, zoom)
}

/// Longitude of a fractional global tile X coordinate
/// (column plus intra-tile offset).
#[inline]
pub fn lon_for_tile_x(x: f64, zoom: u8) -> f64 {
    let n = 2.0_f64.powi(zoom as i32);
    x / n * 360.0 - 180.0
}

/// Latitude of a fractional global tile Y coordinate
/// (row plus intra-tile offset).
#[inline]
pub fn lat_for_tile_y(y: f64, zoom: u8) -> f64 {
    let n = 2.0_f64.powi(zoom as i32);
    let y2 = 180.0 - y * 360.0 / n;
    360.0 / PI * (y2 * PI / 180.0).exp().atan() - 90.0
}

/// Pulls a latitude into the Web Mercator projection range.
#[inline]
pub fn clamp_mercator_lat(lat: f64) -> f64 {
    lat.clamp(MERC_MIN_LAT, MERC_MAX_LAT)
}

/// Expands two bounds given in any order into the sorted inclusive
/// sequence between them. `expand_range(7, 5)` yields `[5, 6, 7]`;
/// `a == b` yields a single element.
pub fn expand_range(a: u32, b: u32) -> Vec<u32> {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    (lo..=hi).collect()
}

#[inline]
fn clamp_index(value: f64, zoom: u8) -> u32 {
    let max = (1u64 << zoom) - 1;
    if value.is_nan() || value < 0.0 {
        0
    } else if value as u64 > max {
        max as u32
    } else {
        value as u32
    }
}
