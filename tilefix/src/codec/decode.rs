//! Tile blob decoding.
//!
//! Decompresses a stored blob, parses the vector-tile protobuf, decodes
//! the geometry command streams, and reprojects tile-local integers into
//! geographic degrees anchored at the tile's own coordinate. Any failure
//! here is fatal for the run.

use std::collections::BTreeMap;
use std::io::Read;

use flate2::read::GzDecoder;
use geo_types::{
    Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon,
};
use prost::Message;

use crate::coord::{lat_for_tile_y, lon_for_tile_x, TileCoord};
use crate::features::{GeoFeature, LayerSet, PropertyValue};

use super::error::CodecError;
use super::vector_tile::{self, GeomType, DEFAULT_EXTENT};

const MOVE_TO: u32 = 1;
const LINE_TO: u32 = 2;
const CLOSE_PATH: u32 = 7;

/// Decodes a stored tile blob into geographic feature collections.
pub fn decode(blob: &[u8], coord: TileCoord) -> Result<LayerSet, CodecError> {
    let raw = decompress(blob)?;
    let tile = vector_tile::Tile::decode(raw.as_slice())?;

    let mut layers = LayerSet::new();
    for layer in &tile.layers {
        let extent = layer.extent.unwrap_or(DEFAULT_EXTENT).max(1);
        let mut features = Vec::with_capacity(layer.features.len());
        for feature in &layer.features {
            let parts = parse_commands(&feature.geometry)?;
            let Some(geometry) = build_geometry(feature.r#type(), parts, coord, extent) else {
                continue;
            };
            features.push(GeoFeature {
                id: feature.id,
                geometry,
                properties: decode_tags(layer, feature)?,
            });
        }
        layers.insert(layer.name.clone(), features);
    }
    Ok(layers)
}

/// Strips the gzip envelope when present; uncompressed blobs pass through.
fn decompress(blob: &[u8]) -> Result<Vec<u8>, CodecError> {
    if blob.len() >= 2 && blob[0] == 0x1f && blob[1] == 0x8b {
        let mut decoder = GzDecoder::new(blob);
        let mut decoded = Vec::new();
        decoder
            .read_to_end(&mut decoded)
            .map_err(CodecError::Decompress)?;
        Ok(decoded)
    } else {
        Ok(blob.to_vec())
    }
}

/// Decodes the command stream into parts of tile-local coordinates.
/// Each MoveTo starts a new part; ClosePath repeats the part's first point.
fn parse_commands(geometry: &[u32]) -> Result<Vec<Vec<(f64, f64)>>, CodecError> {
    let mut parts: Vec<Vec<(f64, f64)>> = Vec::new();
    let mut cursor_x = 0i64;
    let mut cursor_y = 0i64;
    let mut i = 0usize;

    while i < geometry.len() {
        let command = geometry[i];
        let id = command & 0x7;
        let count = (command >> 3) as usize;
        i += 1;

        match id {
            MOVE_TO | LINE_TO => {
                if i + 2 * count > geometry.len() {
                    return Err(CodecError::Geometry("truncated command stream".into()));
                }
                for _ in 0..count {
                    cursor_x += de_zigzag(geometry[i]);
                    cursor_y += de_zigzag(geometry[i + 1]);
                    i += 2;
                    let point = (cursor_x as f64, cursor_y as f64);
                    if id == MOVE_TO {
                        parts.push(vec![point]);
                    } else {
                        match parts.last_mut() {
                            Some(part) => part.push(point),
                            None => {
                                return Err(CodecError::Geometry(
                                    "LineTo before MoveTo".into(),
                                ))
                            }
                        }
                    }
                }
            }
            CLOSE_PATH => {
                match parts.last_mut() {
                    Some(part) if !part.is_empty() => {
                        let first = part[0];
                        part.push(first);
                    }
                    _ => return Err(CodecError::Geometry("ClosePath on empty ring".into())),
                }
            }
            other => {
                return Err(CodecError::Geometry(format!("unknown command {}", other)));
            }
        }
    }
    Ok(parts)
}

fn build_geometry(
    geom_type: GeomType,
    parts: Vec<Vec<(f64, f64)>>,
    coord: TileCoord,
    extent: u32,
) -> Option<Geometry<f64>> {
    match geom_type {
        GeomType::Point => {
            let mut points: Vec<Point<f64>> = parts
                .into_iter()
                .flatten()
                .map(|p| Point::from(project(p, coord, extent)))
                .collect();
            match points.len() {
                0 => None,
                1 => Some(Geometry::Point(points.remove(0))),
                _ => Some(Geometry::MultiPoint(MultiPoint(points))),
            }
        }
        GeomType::Linestring => {
            let mut lines: Vec<LineString<f64>> = parts
                .into_iter()
                .filter(|part| part.len() >= 2)
                .map(|part| project_line(part, coord, extent))
                .collect();
            match lines.len() {
                0 => None,
                1 => Some(Geometry::LineString(lines.remove(0))),
                _ => Some(Geometry::MultiLineString(MultiLineString(lines))),
            }
        }
        GeomType::Polygon => {
            let mut polygons: Vec<Polygon<f64>> = Vec::new();
            for ring in parts {
                if ring.len() < 4 {
                    // Degenerate ring (fewer than three distinct corners)
                    continue;
                }
                // Classify in tile space before projection; the surveyor's
                // formula over y-down coordinates marks exteriors positive.
                let exterior = signed_area(&ring) > 0.0;
                let projected = project_line(ring, coord, extent);
                if exterior || polygons.is_empty() {
                    polygons.push(Polygon::new(projected, vec![]));
                } else if let Some(last) = polygons.last_mut() {
                    last.interiors_push(projected);
                }
            }
            match polygons.len() {
                0 => None,
                1 => Some(Geometry::Polygon(polygons.remove(0))),
                _ => Some(Geometry::MultiPolygon(MultiPolygon(polygons))),
            }
        }
        GeomType::Unknown => None,
    }
}

fn decode_tags(
    layer: &vector_tile::Layer,
    feature: &vector_tile::Feature,
) -> Result<BTreeMap<String, PropertyValue>, CodecError> {
    let mut properties = BTreeMap::new();
    for pair in feature.tags.chunks(2) {
        let [key_index, value_index] = pair else {
            return Err(CodecError::Geometry("odd tag count".into()));
        };
        let key = layer
            .keys
            .get(*key_index as usize)
            .ok_or_else(|| CodecError::Geometry(format!("tag key index {} out of range", key_index)))?;
        let value = layer.values.get(*value_index as usize).ok_or_else(|| {
            CodecError::Geometry(format!("tag value index {} out of range", value_index))
        })?;
        if let Some(value) = decode_value(value) {
            properties.insert(key.clone(), value);
        }
    }
    Ok(properties)
}

fn decode_value(value: &vector_tile::Value) -> Option<PropertyValue> {
    if let Some(s) = &value.string_value {
        Some(PropertyValue::String(s.clone()))
    } else if let Some(f) = value.float_value {
        Some(PropertyValue::Float(f))
    } else if let Some(d) = value.double_value {
        Some(PropertyValue::Double(d))
    } else if let Some(i) = value.int_value {
        Some(PropertyValue::Int(i))
    } else if let Some(u) = value.uint_value {
        Some(PropertyValue::Uint(u))
    } else if let Some(s) = value.sint_value {
        Some(PropertyValue::Int(s))
    } else {
        value.bool_value.map(PropertyValue::Bool)
    }
}

fn project(p: (f64, f64), coord: TileCoord, extent: u32) -> Coord<f64> {
    let extent = f64::from(extent);
    let x = f64::from(coord.column) + p.0 / extent;
    let y = f64::from(coord.row) + p.1 / extent;
    Coord {
        x: lon_for_tile_x(x, coord.zoom),
        y: lat_for_tile_y(y, coord.zoom),
    }
}

fn project_line(part: Vec<(f64, f64)>, coord: TileCoord, extent: u32) -> LineString<f64> {
    LineString(
        part.into_iter()
            .map(|p| project(p, coord, extent))
            .collect(),
    )
}

/// Shoelace sum over tile-space coordinates (y-down).
pub(super) fn signed_area(ring: &[(f64, f64)]) -> f64 {
    let mut sum = 0.0;
    for i in 0..ring.len() {
        let (x0, y0) = ring[i];
        let (x1, y1) = ring[(i + 1) % ring.len()];
        sum += x0 * y1 - x1 * y0;
    }
    sum / 2.0
}

fn de_zigzag(value: u32) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zigzag(value: i64) -> u32 {
        ((value << 1) ^ (value >> 63)) as u32
    }

    #[test]
    fn test_de_zigzag() {
        for value in [0i64, 1, -1, 4095, -4096, 1 << 20] {
            assert_eq!(de_zigzag(zigzag(value)), value);
        }
    }

    #[test]
    fn test_parse_point_commands() {
        // MoveTo(1): (25, 17)
        let geometry = vec![(1 << 3) | MOVE_TO, zigzag(25), zigzag(17)];
        let parts = parse_commands(&geometry).unwrap();
        assert_eq!(parts, vec![vec![(25.0, 17.0)]]);
    }

    #[test]
    fn test_parse_multipoint_commands() {
        // MoveTo(2): (5,7) then relative (-2,+3)
        let geometry = vec![(2 << 3) | MOVE_TO, zigzag(5), zigzag(7), zigzag(-2), zigzag(3)];
        let parts = parse_commands(&geometry).unwrap();
        assert_eq!(parts, vec![vec![(5.0, 7.0)], vec![(3.0, 10.0)]]);
    }

    #[test]
    fn test_parse_linestring_commands() {
        let geometry = vec![
            (1 << 3) | MOVE_TO,
            zigzag(2),
            zigzag(2),
            (2 << 3) | LINE_TO,
            zigzag(10),
            zigzag(0),
            zigzag(0),
            zigzag(10),
        ];
        let parts = parse_commands(&geometry).unwrap();
        assert_eq!(parts, vec![vec![(2.0, 2.0), (12.0, 2.0), (12.0, 12.0)]]);
    }

    #[test]
    fn test_parse_ring_close_repeats_first() {
        let geometry = vec![
            (1 << 3) | MOVE_TO,
            zigzag(0),
            zigzag(0),
            (3 << 3) | LINE_TO,
            zigzag(10),
            zigzag(0),
            zigzag(0),
            zigzag(10),
            zigzag(-10),
            zigzag(0),
            CLOSE_PATH | (1 << 3),
        ];
        let parts = parse_commands(&geometry).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].first(), parts[0].last());
        assert_eq!(parts[0].len(), 5);
    }

    #[test]
    fn test_truncated_stream_rejected() {
        let geometry = vec![(2 << 3) | MOVE_TO, zigzag(1)];
        assert!(matches!(
            parse_commands(&geometry),
            Err(CodecError::Geometry(_))
        ));
    }

    #[test]
    fn test_line_to_before_move_to_rejected() {
        let geometry = vec![(1 << 3) | LINE_TO, zigzag(1), zigzag(1)];
        assert!(parse_commands(&geometry).is_err());
    }

    #[test]
    fn test_signed_area_orientation() {
        // Clockwise on screen (y-down) is positive under the shoelace sum
        let cw = vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        assert!(signed_area(&cw) > 0.0);
        let ccw: Vec<_> = cw.iter().rev().copied().collect();
        assert!(signed_area(&ccw) < 0.0);
    }

    #[test]
    fn test_decode_rejects_garbage_protobuf() {
        let coord = TileCoord::new(5, 3, 2);
        let garbage = vec![0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff];
        assert!(decode(&garbage, coord).is_err());
    }

    #[test]
    fn test_decode_rejects_corrupt_gzip() {
        let coord = TileCoord::new(5, 3, 2);
        // Valid magic, garbage body
        let corrupt = vec![0x1f, 0x8b, 0x00, 0x01, 0x02, 0x03];
        assert!(matches!(
            decode(&corrupt, coord),
            Err(CodecError::Decompress(_))
        ));
    }

    #[test]
    fn test_projection_anchors_at_tile() {
        // Tile-local (0,0) is the tile's northwest corner
        let coord = TileCoord::new(1, 1, 0);
        let nw = project((0.0, 0.0), coord, 4096);
        assert!((nw.x - 0.0).abs() < 1e-9);
        assert!((nw.y - 85.05112878).abs() < 1e-6);

        // Tile-local (extent, extent) is the southeast corner
        let se = project((4096.0, 4096.0), coord, 4096);
        assert!((se.x - 180.0).abs() < 1e-9);
        assert!((se.y - 0.0).abs() < 1e-9);
    }
}
