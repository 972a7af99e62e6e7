//! Dataset metadata as read from the tile store.
//!
//! `DatasetInfo` is read once per run and never mutated. The `scheme`
//! string is carried verbatim for reporting; row-numbering conversion is
//! the store adapter's concern, not the core's.

use std::fmt;

use crate::coord::GeoBounds;

/// Declared tile encoding of a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileFormat {
    /// Protobuf vector tiles (`pbf` / `mvt` in MBTiles metadata)
    Pbf,
    /// Anything else; rejected before any tile work starts
    Other(String),
}

impl TileFormat {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "pbf" | "mvt" => TileFormat::Pbf,
            other => TileFormat::Other(other.to_string()),
        }
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, TileFormat::Pbf)
    }
}

impl fmt::Display for TileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileFormat::Pbf => write!(f, "pbf"),
            TileFormat::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Read-only dataset description sourced from the store metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetInfo {
    pub id: String,
    pub name: String,
    pub format: TileFormat,
    /// Row-numbering convention (`tms` or `xyz`), threaded through unchanged
    pub scheme: String,
    pub minzoom: u8,
    pub maxzoom: u8,
    pub bounds: GeoBounds,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parse_vector_family() {
        assert_eq!(TileFormat::parse("pbf"), TileFormat::Pbf);
        assert_eq!(TileFormat::parse("PBF"), TileFormat::Pbf);
        assert_eq!(TileFormat::parse("mvt"), TileFormat::Pbf);
        assert!(TileFormat::parse("pbf").is_vector());
    }

    #[test]
    fn test_format_parse_other() {
        let format = TileFormat::parse("png");
        assert_eq!(format, TileFormat::Other("png".to_string()));
        assert!(!format.is_vector());
        assert_eq!(format.to_string(), "png");
    }
}
