//! GeoJSON interchange for layer sets.
//!
//! The external transform receives one JSON object per tile, keyed by
//! layer name, each value a GeoJSON FeatureCollection. The reply uses the
//! same shape. Only the geometry types a vector tile can carry are
//! supported.

use std::collections::BTreeMap;

use geo_types::{
    Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon,
};
use serde_json::{json, Map, Value};
use thiserror::Error;

use super::{GeoFeature, LayerSet, PropertyValue};

/// Errors raised while parsing a transform reply.
#[derive(Debug, Error)]
pub enum GeoJsonError {
    #[error("expected {expected}, got {got}")]
    UnexpectedShape {
        expected: &'static str,
        got: String,
    },
    #[error("unsupported geometry type: {0}")]
    UnsupportedGeometry(String),
    #[error("malformed coordinates: {0}")]
    MalformedCoordinates(String),
}

/// Renders a layer set as `{layer: FeatureCollection, ...}`.
pub fn layers_to_json(layers: &LayerSet) -> Value {
    let mut out = Map::new();
    for (name, features) in layers {
        let collection: Vec<Value> = features.iter().map(feature_to_json).collect();
        out.insert(
            name.clone(),
            json!({ "type": "FeatureCollection", "features": collection }),
        );
    }
    Value::Object(out)
}

/// Parses a `{layer: FeatureCollection, ...}` object back into a layer set.
pub fn layers_from_json(value: &Value) -> Result<LayerSet, GeoJsonError> {
    let object = value.as_object().ok_or_else(|| shape("object", value))?;
    let mut layers = LayerSet::new();
    for (name, collection) in object {
        let features = collection
            .get("features")
            .and_then(Value::as_array)
            .ok_or_else(|| shape("FeatureCollection", collection))?;
        let parsed: Result<Vec<GeoFeature>, GeoJsonError> =
            features.iter().map(feature_from_json).collect();
        layers.insert(name.clone(), parsed?);
    }
    Ok(layers)
}

fn feature_to_json(feature: &GeoFeature) -> Value {
    let mut properties = Map::new();
    for (key, value) in &feature.properties {
        properties.insert(key.clone(), value.to_json());
    }
    let mut out = Map::new();
    out.insert("type".into(), Value::String("Feature".into()));
    if let Some(id) = feature.id {
        out.insert("id".into(), Value::Number(id.into()));
    }
    out.insert("properties".into(), Value::Object(properties));
    out.insert("geometry".into(), geometry_to_json(&feature.geometry));
    Value::Object(out)
}

fn feature_from_json(value: &Value) -> Result<GeoFeature, GeoJsonError> {
    let object = value.as_object().ok_or_else(|| shape("Feature", value))?;
    let geometry = object
        .get("geometry")
        .ok_or_else(|| shape("Feature with geometry", value))?;
    let mut feature = GeoFeature::new(geometry_from_json(geometry)?);
    feature.id = object.get("id").and_then(Value::as_u64);
    if let Some(properties) = object.get("properties").and_then(Value::as_object) {
        let mut parsed = BTreeMap::new();
        for (key, raw) in properties {
            if let Some(value) = PropertyValue::from_json(raw) {
                parsed.insert(key.clone(), value);
            }
        }
        feature.properties = parsed;
    }
    Ok(feature)
}

fn geometry_to_json(geometry: &Geometry<f64>) -> Value {
    match geometry {
        Geometry::Point(p) => json!({ "type": "Point", "coordinates": position(p.0) }),
        Geometry::MultiPoint(mp) => json!({
            "type": "MultiPoint",
            "coordinates": mp.iter().map(|p| position(p.0)).collect::<Vec<_>>(),
        }),
        Geometry::LineString(ls) => json!({
            "type": "LineString",
            "coordinates": line(ls),
        }),
        Geometry::MultiLineString(mls) => json!({
            "type": "MultiLineString",
            "coordinates": mls.iter().map(line).collect::<Vec<_>>(),
        }),
        Geometry::Polygon(poly) => json!({
            "type": "Polygon",
            "coordinates": rings(poly),
        }),
        Geometry::MultiPolygon(mp) => json!({
            "type": "MultiPolygon",
            "coordinates": mp.iter().map(rings).collect::<Vec<_>>(),
        }),
        // Remaining geo-types variants never come out of the decoder.
        other => json!({
            "type": "GeometryCollection",
            "geometries": Value::Array(vec![]),
            "unsupported": format!("{other:?}"),
        }),
    }
}

fn geometry_from_json(value: &Value) -> Result<Geometry<f64>, GeoJsonError> {
    let object = value.as_object().ok_or_else(|| shape("geometry", value))?;
    let kind = object
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| shape("geometry type", value))?;
    let coordinates = object
        .get("coordinates")
        .ok_or_else(|| shape("coordinates", value))?;
    match kind {
        "Point" => Ok(Geometry::Point(Point::from(parse_position(coordinates)?))),
        "MultiPoint" => {
            let coords = parse_positions(coordinates)?;
            Ok(Geometry::MultiPoint(MultiPoint(
                coords.into_iter().map(Point::from).collect(),
            )))
        }
        "LineString" => Ok(Geometry::LineString(LineString(parse_positions(
            coordinates,
        )?))),
        "MultiLineString" => {
            let lines = parse_nested(coordinates)?;
            Ok(Geometry::MultiLineString(MultiLineString(
                lines.into_iter().map(LineString).collect(),
            )))
        }
        "Polygon" => Ok(Geometry::Polygon(parse_polygon(coordinates)?)),
        "MultiPolygon" => {
            let polys = coordinates
                .as_array()
                .ok_or_else(|| shape("MultiPolygon coordinates", coordinates))?;
            let parsed: Result<Vec<Polygon<f64>>, GeoJsonError> =
                polys.iter().map(parse_polygon).collect();
            Ok(Geometry::MultiPolygon(MultiPolygon(parsed?)))
        }
        other => Err(GeoJsonError::UnsupportedGeometry(other.to_string())),
    }
}

fn parse_polygon(value: &Value) -> Result<Polygon<f64>, GeoJsonError> {
    let mut rings = parse_nested(value)?;
    if rings.is_empty() {
        return Err(GeoJsonError::MalformedCoordinates(
            "polygon without rings".into(),
        ));
    }
    let exterior = LineString(rings.remove(0));
    let interiors = rings.into_iter().map(LineString).collect();
    Ok(Polygon::new(exterior, interiors))
}

fn position(coord: Coord<f64>) -> Vec<f64> {
    vec![coord.x, coord.y]
}

fn line(ls: &LineString<f64>) -> Vec<Vec<f64>> {
    ls.coords().map(|c| position(*c)).collect()
}

fn rings(poly: &Polygon<f64>) -> Vec<Vec<Vec<f64>>> {
    let mut out = vec![line(poly.exterior())];
    out.extend(poly.interiors().iter().map(line));
    out
}

fn parse_position(value: &Value) -> Result<Coord<f64>, GeoJsonError> {
    let parts = value
        .as_array()
        .ok_or_else(|| shape("position", value))?
        .iter()
        .map(Value::as_f64)
        .collect::<Option<Vec<f64>>>()
        .ok_or_else(|| GeoJsonError::MalformedCoordinates("non-numeric position".into()))?;
    if parts.len() < 2 {
        return Err(GeoJsonError::MalformedCoordinates(
            "position with fewer than two values".into(),
        ));
    }
    Ok(Coord {
        x: parts[0],
        y: parts[1],
    })
}

fn parse_positions(value: &Value) -> Result<Vec<Coord<f64>>, GeoJsonError> {
    value
        .as_array()
        .ok_or_else(|| shape("position array", value))?
        .iter()
        .map(parse_position)
        .collect()
}

fn parse_nested(value: &Value) -> Result<Vec<Vec<Coord<f64>>>, GeoJsonError> {
    value
        .as_array()
        .ok_or_else(|| shape("coordinate array", value))?
        .iter()
        .map(parse_positions)
        .collect()
}

fn shape(expected: &'static str, got: &Value) -> GeoJsonError {
    let summary = match got {
        Value::Object(_) => "object".to_string(),
        Value::Array(_) => "array".to_string(),
        other => other.to_string(),
    };
    GeoJsonError::UnexpectedShape {
        expected,
        got: summary,
    }
}
