//! Command-line argument parsing helpers.
//!
//! The zoom and bbox flags accept loosely formatted values and are
//! normalized here: out-of-range numbers are pulled into range rather
//! than rejected, matching how the pipeline treats requests that exceed
//! what the dataset declares.

use tilefix::coord::{
    CoordError, GeoBounds, ZoomRange, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON,
};

/// Parses a zoom expression into a range.
///
/// Accepts a single level ("5"), a separated pair ("3-9", "3,9", "9-3"),
/// or anything with no digits at all, which means every level. Levels
/// beyond the supported maximum are clamped to it.
pub fn parse_zoom(expr: &str) -> ZoomRange {
    let numbers: Vec<u8> = expr
        .split(|c: char| !c.is_ascii_digit())
        .filter(|part| !part.is_empty())
        .filter_map(|part| part.parse::<u32>().ok())
        .map(|z| z.min(u32::from(MAX_ZOOM)) as u8)
        .collect();

    match numbers.as_slice() {
        [] => ZoomRange::full(),
        [z] => ZoomRange { min: *z, max: *z },
        many => {
            let min = many.iter().copied().min().unwrap_or(0);
            let max = many.iter().copied().max().unwrap_or(MAX_ZOOM);
            ZoomRange { min, max }
        }
    }
}

/// Parses a bbox flag value: four comma-separated numbers as
/// west,south,east,north. Each number is clamped to its axis range
/// before validation.
pub fn parse_bbox(expr: &str) -> Result<GeoBounds, String> {
    let parts: Vec<f64> = expr
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid bbox '{}': {}", expr, e))?;
    if parts.len() != 4 {
        return Err(format!(
            "invalid bbox '{}': expected west,south,east,north",
            expr
        ));
    }

    GeoBounds::new(
        parts[0].clamp(MIN_LON, MAX_LON),
        parts[1].clamp(MIN_LAT, MAX_LAT),
        parts[2].clamp(MIN_LON, MAX_LON),
        parts[3].clamp(MIN_LAT, MAX_LAT),
    )
    .map_err(|e: CoordError| format!("invalid bbox '{}': {}", expr, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_zoom_single() {
        assert_eq!(parse_zoom("5"), ZoomRange { min: 5, max: 5 });
    }

    #[test]
    fn test_parse_zoom_pair() {
        assert_eq!(parse_zoom("3-9"), ZoomRange { min: 3, max: 9 });
        assert_eq!(parse_zoom("3,9"), ZoomRange { min: 3, max: 9 });
    }

    #[test]
    fn test_parse_zoom_reversed_pair() {
        assert_eq!(parse_zoom("9-3"), ZoomRange { min: 3, max: 9 });
    }

    #[test]
    fn test_parse_zoom_empty_means_all() {
        assert_eq!(parse_zoom(""), ZoomRange::full());
        assert_eq!(parse_zoom("all"), ZoomRange::full());
    }

    #[test]
    fn test_parse_zoom_clamps_to_max() {
        assert_eq!(parse_zoom("99"), ZoomRange { min: 24, max: 24 });
        assert_eq!(parse_zoom("5-99"), ZoomRange { min: 5, max: 24 });
    }

    #[test]
    fn test_parse_bbox() {
        let bounds = parse_bbox("-74.3, 40.4, -73.6, 41.0").unwrap();
        assert_eq!(bounds, GeoBounds::new(-74.3, 40.4, -73.6, 41.0).unwrap());
    }

    #[test]
    fn test_parse_bbox_clamps_out_of_range() {
        let bounds = parse_bbox("-200,-95,200,95").unwrap();
        assert_eq!(bounds, GeoBounds::new(-180.0, -90.0, 180.0, 90.0).unwrap());
    }

    #[test]
    fn test_parse_bbox_rejects_wrong_arity() {
        assert!(parse_bbox("1,2,3").is_err());
        assert!(parse_bbox("").is_err());
    }

    #[test]
    fn test_parse_bbox_rejects_garbage() {
        assert!(parse_bbox("a,b,c,d").is_err());
    }

    #[test]
    fn test_parse_bbox_rejects_inverted() {
        assert!(parse_bbox("10,0,-10,5").is_err());
    }
}
