//! Tile blob encoding.
//!
//! Re-tiles geographic features for exactly one tile coordinate: project
//! into the tile's local grid, clip to extent plus buffer, round to the
//! integer grid, and serialize with the mvt crate. No simplification is
//! applied; a single-tile rewrite must not degrade geometry.

use std::f64::consts::PI;
use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use geo_types::{Coord, Geometry, LineString, Polygon};
use mvt::{GeomData, GeomEncoder, GeomType, Tile};

use crate::coord::{clamp_mercator_lat, TileCoord};
use crate::features::{LayerSet, PropertyValue};

use super::clip::{clip_line, clip_ring, point_in};
use super::decode::signed_area;
use super::error::CodecError;
use super::vector_tile::DEFAULT_EXTENT;

/// Default buffer kept beyond the tile edge, matching the grid resolution.
pub const DEFAULT_BUFFER: u32 = 4096;

/// Gzip level used for stored blobs.
const GZIP_LEVEL: u32 = 4;

/// Encode-side grid parameters, supplied by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Tile grid resolution
    pub extent: u32,
    /// Geometry overlap kept beyond the tile edge
    pub buffer: u32,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            extent: DEFAULT_EXTENT,
            buffer: DEFAULT_BUFFER,
        }
    }
}

/// Encodes feature collections into a compressed tile blob for `coord`.
pub fn encode(
    coord: TileCoord,
    layers: &LayerSet,
    options: &EncodeOptions,
) -> Result<Vec<u8>, CodecError> {
    let mut tile = Tile::new(options.extent);
    for (name, features) in layers {
        let mut layer = tile.create_layer(name);
        for feature in features {
            let Some(geom_data) = encode_geometry(&feature.geometry, coord, options)? else {
                continue;
            };
            let mut out = layer.into_feature(geom_data);
            if let Some(id) = feature.id {
                out.set_id(id);
            }
            for (key, value) in &feature.properties {
                match value {
                    PropertyValue::String(s) => out.add_tag_string(key, s),
                    PropertyValue::Float(v) => out.add_tag_float(key, *v),
                    PropertyValue::Double(v) => out.add_tag_double(key, *v),
                    PropertyValue::Int(v) => out.add_tag_int(key, *v),
                    PropertyValue::Uint(v) => out.add_tag_uint(key, *v),
                    PropertyValue::Bool(v) => out.add_tag_bool(key, *v),
                }
            }
            layer = out.into_layer();
        }
        if layer.num_features() > 0 {
            tile.add_layer(layer)?;
        }
    }
    compress(&tile.to_bytes()?)
}

fn compress(bytes: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::new(GZIP_LEVEL));
    encoder.write_all(bytes).map_err(CodecError::Compress)?;
    encoder.finish().map_err(CodecError::Compress)
}

fn encode_geometry(
    geometry: &Geometry<f64>,
    coord: TileCoord,
    options: &EncodeOptions,
) -> Result<Option<GeomData>, CodecError> {
    let lo = -f64::from(options.buffer);
    let hi = f64::from(options.extent) + f64::from(options.buffer);
    match geometry {
        Geometry::Point(p) => {
            encode_points(vec![project(p.0, coord, options.extent)], lo, hi)
        }
        Geometry::MultiPoint(mp) => encode_points(
            mp.iter()
                .map(|p| project(p.0, coord, options.extent))
                .collect(),
            lo,
            hi,
        ),
        Geometry::LineString(ls) => {
            encode_lines(vec![project_line(ls, coord, options.extent)], lo, hi)
        }
        Geometry::MultiLineString(mls) => encode_lines(
            mls.iter()
                .map(|ls| project_line(ls, coord, options.extent))
                .collect(),
            lo,
            hi,
        ),
        Geometry::Polygon(poly) => encode_polygons(std::slice::from_ref(poly), coord, options, lo, hi),
        Geometry::MultiPolygon(mp) => encode_polygons(&mp.0, coord, options, lo, hi),
        // Other geo-types variants never reach the encoder.
        _ => Ok(None),
    }
}

fn encode_points(
    projected: Vec<(f64, f64)>,
    lo: f64,
    hi: f64,
) -> Result<Option<GeomData>, CodecError> {
    let kept: Vec<(f64, f64)> = projected
        .into_iter()
        .map(round_point)
        .filter(|p| point_in(*p, lo, hi))
        .collect();
    if kept.is_empty() {
        return Ok(None);
    }
    let mut encoder = GeomEncoder::new(GeomType::Point);
    for (x, y) in kept {
        encoder = encoder.point(x, y)?;
    }
    Ok(Some(encoder.encode()?))
}

fn encode_lines(
    projected: Vec<Vec<(f64, f64)>>,
    lo: f64,
    hi: f64,
) -> Result<Option<GeomData>, CodecError> {
    let mut parts: Vec<Vec<(f64, f64)>> = Vec::new();
    for line in &projected {
        for part in clip_line(line, lo, hi) {
            let cleaned = dedupe(part.into_iter().map(round_point));
            if cleaned.len() >= 2 {
                parts.push(cleaned);
            }
        }
    }
    if parts.is_empty() {
        return Ok(None);
    }
    let mut encoder = GeomEncoder::new(GeomType::Linestring);
    for part in parts {
        for (x, y) in part {
            encoder = encoder.point(x, y)?;
        }
        encoder = encoder.complete()?;
    }
    Ok(Some(encoder.encode()?))
}

fn encode_polygons(
    polygons: &[Polygon<f64>],
    coord: TileCoord,
    options: &EncodeOptions,
    lo: f64,
    hi: f64,
) -> Result<Option<GeomData>, CodecError> {
    let mut rings: Vec<Vec<(f64, f64)>> = Vec::new();
    for polygon in polygons {
        let Some(exterior) = prepare_ring(polygon.exterior(), coord, options, lo, hi, true) else {
            // Dropping the shell drops its holes too
            continue;
        };
        rings.push(exterior);
        for interior in polygon.interiors() {
            if let Some(ring) = prepare_ring(interior, coord, options, lo, hi, false) {
                rings.push(ring);
            }
        }
    }
    if rings.is_empty() {
        return Ok(None);
    }
    let mut encoder = GeomEncoder::new(GeomType::Polygon);
    for ring in rings {
        for (x, y) in ring {
            encoder = encoder.point(x, y)?;
        }
        encoder = encoder.complete()?;
    }
    Ok(Some(encoder.encode()?))
}

/// Projects, clips, quantizes, and orients one ring. Returns `None` when
/// it degenerates below three corners or to zero area.
fn prepare_ring(
    ring: &LineString<f64>,
    coord: TileCoord,
    options: &EncodeOptions,
    lo: f64,
    hi: f64,
    exterior: bool,
) -> Option<Vec<(f64, f64)>> {
    let mut projected = project_line(ring, coord, options.extent);
    // geo-types rings repeat the first point; the clipper wants them open
    if projected.len() >= 2 && projected.first() == projected.last() {
        projected.pop();
    }
    let clipped = clip_ring(&projected, lo, hi);
    let mut cleaned = dedupe(clipped.into_iter().map(round_point));
    if cleaned.len() >= 2 && cleaned.first() == cleaned.last() {
        cleaned.pop();
    }
    if cleaned.len() < 3 {
        return None;
    }
    let area = signed_area(&cleaned);
    if area == 0.0 {
        return None;
    }
    // Exteriors carry positive area in tile space, interiors negative
    if (area > 0.0) != exterior {
        cleaned.reverse();
    }
    Some(cleaned)
}

fn project(c: Coord<f64>, coord: TileCoord, extent: u32) -> (f64, f64) {
    let n = 2.0_f64.powi(coord.zoom as i32);
    let extent = f64::from(extent);
    let x = ((c.x + 180.0) / 360.0 * n - f64::from(coord.column)) * extent;
    let lat_rad = clamp_mercator_lat(c.y).to_radians();
    let merc = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0;
    let y = (merc * n - f64::from(coord.row)) * extent;
    (x, y)
}

fn project_line(ls: &LineString<f64>, coord: TileCoord, extent: u32) -> Vec<(f64, f64)> {
    ls.coords().map(|c| project(*c, coord, extent)).collect()
}

fn round_point(p: (f64, f64)) -> (f64, f64) {
    (p.0.round(), p.1.round())
}

fn dedupe(points: impl Iterator<Item = (f64, f64)>) -> Vec<(f64, f64)> {
    let mut out: Vec<(f64, f64)> = Vec::new();
    for p in points {
        if out.last() != Some(&p) {
            out.push(p);
        }
    }
    out
}
