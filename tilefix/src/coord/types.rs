//! Coordinate type definitions

use std::fmt;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Valid latitude range
pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;

/// Web Mercator valid latitude range; rows are undefined beyond this,
/// so latitudes are pulled into it before row computation.
pub const MERC_MIN_LAT: f64 = -85.05112878;
pub const MERC_MAX_LAT: f64 = 85.05112878;

/// Supported zoom levels
pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 24;

/// Tile coordinates in the Web Mercator / Slippy Map system.
///
/// `row` is 0 at the north edge, `column` 0 at the west edge (XYZ
/// numbering). Stores using TMS numbering convert at their own boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    /// Zoom level (0-24)
    pub zoom: u8,
    /// X coordinate (east-west), 0 at west
    pub column: u32,
    /// Y coordinate (north-south), 0 at north
    pub row: u32,
}

impl TileCoord {
    pub fn new(zoom: u8, column: u32, row: u32) -> Self {
        Self { zoom, column, row }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.column, self.row)
    }
}

/// Geographic bounding box in degrees.
///
/// Invariant after clamping: `min_lon <= max_lon` and `min_lat <= max_lat`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

/// The whole world.
pub const WORLD_BOUNDS: GeoBounds = GeoBounds {
    min_lon: MIN_LON,
    min_lat: MIN_LAT,
    max_lon: MAX_LON,
    max_lat: MAX_LAT,
};

impl GeoBounds {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Result<Self, CoordError> {
        let bounds = Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        };
        bounds.validate()?;
        Ok(bounds)
    }

    fn validate(&self) -> Result<(), CoordError> {
        for lon in [self.min_lon, self.max_lon] {
            if !(MIN_LON..=MAX_LON).contains(&lon) || !lon.is_finite() {
                return Err(CoordError::InvalidLongitude(lon));
            }
        }
        for lat in [self.min_lat, self.max_lat] {
            if !(MIN_LAT..=MAX_LAT).contains(&lat) || !lat.is_finite() {
                return Err(CoordError::InvalidLatitude(lat));
            }
        }
        if self.min_lon > self.max_lon || self.min_lat > self.max_lat {
            return Err(CoordError::InvertedBounds);
        }
        Ok(())
    }

    /// Clamps every coordinate independently into `other`'s range on its
    /// axis. Idempotent for boxes already inside `other`.
    pub fn clamp_to(&self, other: &GeoBounds) -> GeoBounds {
        GeoBounds {
            min_lon: self.min_lon.clamp(other.min_lon, other.max_lon),
            min_lat: self.min_lat.clamp(other.min_lat, other.max_lat),
            max_lon: self.max_lon.clamp(other.min_lon, other.max_lon),
            max_lat: self.max_lat.clamp(other.min_lat, other.max_lat),
        }
    }
}

/// Inclusive zoom range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomRange {
    pub min: u8,
    pub max: u8,
}

impl ZoomRange {
    pub fn new(min: u8, max: u8) -> Result<Self, CoordError> {
        if min > MAX_ZOOM {
            return Err(CoordError::InvalidZoom(min));
        }
        if max > MAX_ZOOM {
            return Err(CoordError::InvalidZoom(max));
        }
        if min > max {
            // Callers pass bounds in any order.
            Ok(Self { min: max, max: min })
        } else {
            Ok(Self { min, max })
        }
    }

    /// A range covering exactly one level.
    pub fn single(zoom: u8) -> Result<Self, CoordError> {
        Self::new(zoom, zoom)
    }

    /// Every supported level.
    pub fn full() -> Self {
        Self {
            min: MIN_ZOOM,
            max: MAX_ZOOM,
        }
    }

    /// Clamps both bounds independently into `[min, max]`. Idempotent for
    /// ranges already inside. Inverted limits, seen in datasets whose
    /// metadata stores the zoom bounds backwards, are reordered first.
    pub fn clamp_to(&self, min: u8, max: u8) -> ZoomRange {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        ZoomRange {
            min: self.min.clamp(lo, hi),
            max: self.max.clamp(lo, hi),
        }
    }
}

impl fmt::Display for ZoomRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.min == self.max {
            write!(f, "{}", self.min)
        } else {
            write!(f, "{}-{}", self.min, self.max)
        }
    }
}

/// Errors that can occur during coordinate handling.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordError {
    /// Latitude is outside valid range (-90 to 90)
    InvalidLatitude(f64),
    /// Longitude is outside valid range (-180 to 180)
    InvalidLongitude(f64),
    /// Zoom level is outside valid range (0 to 24)
    InvalidZoom(u8),
    /// Bounding box with min > max on an axis
    InvertedBounds,
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::InvalidLatitude(lat) => {
                write!(
                    f,
                    "Invalid latitude: {} (must be between {} and {})",
                    lat, MIN_LAT, MAX_LAT
                )
            }
            CoordError::InvalidLongitude(lon) => {
                write!(
                    f,
                    "Invalid longitude: {} (must be between {} and {})",
                    lon, MIN_LON, MAX_LON
                )
            }
            CoordError::InvalidZoom(zoom) => {
                write!(
                    f,
                    "Invalid zoom level: {} (must be between {} and {})",
                    zoom, MIN_ZOOM, MAX_ZOOM
                )
            }
            CoordError::InvertedBounds => {
                write!(f, "Invalid bounding box: min exceeds max")
            }
        }
    }
}

impl std::error::Error for CoordError {}
