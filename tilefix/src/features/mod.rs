//! Decoded feature model.
//!
//! A decoded tile is a [`LayerSet`]: layer name to features, each feature
//! carrying a geographic geometry (degrees) and its properties. Layer sets
//! are built fresh per tile by the codec, optionally replaced wholesale by
//! the transform, and discarded after encode.

pub mod geojson;

pub use geojson::GeoJsonError;

use std::collections::BTreeMap;

use geo_types::Geometry;

/// A property value, mirroring the vector-tile value variants.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    String(String),
    Float(f32),
    Double(f64),
    Int(i64),
    Uint(u64),
    Bool(bool),
}

impl PropertyValue {
    /// JSON rendition used on the transform wire.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            PropertyValue::String(s) => serde_json::Value::String(s.clone()),
            PropertyValue::Float(v) => serde_json::Number::from_f64(f64::from(*v))
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            PropertyValue::Double(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            PropertyValue::Int(v) => serde_json::Value::Number((*v).into()),
            PropertyValue::Uint(v) => serde_json::Value::Number((*v).into()),
            PropertyValue::Bool(v) => serde_json::Value::Bool(*v),
        }
    }

    /// Parses a JSON property value. Integers stay integral, other numbers
    /// become doubles, and structured values are stringified since a tile
    /// value cannot hold them. `null` yields `None`.
    ///
    /// JSON numbers carry no signedness, so a non-negative integer comes
    /// back as `Int` whenever it fits in `i64`; only values above
    /// `i64::MAX` land in `Uint`.
    pub fn from_json(value: &serde_json::Value) -> Option<PropertyValue> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::Bool(b) => Some(PropertyValue::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(PropertyValue::Int(i))
                } else if let Some(u) = n.as_u64() {
                    Some(PropertyValue::Uint(u))
                } else {
                    n.as_f64().map(PropertyValue::Double)
                }
            }
            serde_json::Value::String(s) => Some(PropertyValue::String(s.clone())),
            other => Some(PropertyValue::String(other.to_string())),
        }
    }
}

/// One decoded feature: geographic geometry plus properties.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoFeature {
    pub id: Option<u64>,
    pub geometry: Geometry<f64>,
    pub properties: BTreeMap<String, PropertyValue>,
}

impl GeoFeature {
    pub fn new(geometry: Geometry<f64>) -> Self {
        Self {
            id: None,
            geometry,
            properties: BTreeMap::new(),
        }
    }
}

/// Decoded contents of one tile: layer name to feature collection.
///
/// Ordered map so re-encoding a tile visits layers deterministically.
pub type LayerSet = BTreeMap<String, Vec<GeoFeature>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_value_json_roundtrip() {
        let cases = [
            PropertyValue::String("name".to_string()),
            PropertyValue::Int(-42),
            PropertyValue::Bool(true),
        ];
        for value in cases {
            let json = value.to_json();
            let back = PropertyValue::from_json(&json).unwrap();
            assert_eq!(back, value);
        }
    }

    #[test]
    fn test_property_value_uint_narrows_to_int() {
        // JSON carries no signedness, so anything fitting i64 parses as Int.
        let json = PropertyValue::Uint(9_007_199_254_740_993).to_json();
        assert_eq!(
            PropertyValue::from_json(&json),
            Some(PropertyValue::Int(9_007_199_254_740_993))
        );

        // Only values past i64::MAX stay unsigned.
        let json = PropertyValue::Uint(u64::MAX).to_json();
        assert_eq!(
            PropertyValue::from_json(&json),
            Some(PropertyValue::Uint(u64::MAX))
        );
    }

    #[test]
    fn test_property_value_double_roundtrip() {
        let json = PropertyValue::Double(1.5).to_json();
        assert_eq!(
            PropertyValue::from_json(&json),
            Some(PropertyValue::Double(1.5))
        );
    }

    #[test]
    fn test_property_value_null_dropped() {
        assert_eq!(PropertyValue::from_json(&serde_json::Value::Null), None);
    }

    #[test]
    fn test_property_value_object_stringified() {
        let json: serde_json::Value = serde_json::json!({"a": 1});
        let value = PropertyValue::from_json(&json).unwrap();
        assert_eq!(value, PropertyValue::String("{\"a\":1}".to_string()));
    }
}
