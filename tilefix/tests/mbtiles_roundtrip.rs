//! End-to-end test against a real MBTiles file.
//!
//! Builds a small temp-file dataset, runs an edit over it, then re-opens
//! the file and verifies the rewritten tiles decode to the edited
//! features with layer names, properties and geometry intact.

use std::sync::Arc;

use geo_types::{Geometry, LineString, Point};
use rusqlite::{params, Connection};
use tempfile::TempDir;
use tilefix::codec::{decode, encode, EncodeOptions};
use tilefix::coord::{GeoBounds, TileCoord, ZoomRange};
use tilefix::features::{GeoFeature, LayerSet, PropertyValue};
use tilefix::pipeline::{run, RunOptions};
use tilefix::store::{MbtilesStore, TileStore};
use tilefix::transform::FnTransform;

fn create_dataset(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("roads.mbtiles");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE metadata (name TEXT, value TEXT);
         CREATE TABLE tiles (zoom_level INTEGER, tile_column INTEGER, \
            tile_row INTEGER, tile_data BLOB);
         CREATE UNIQUE INDEX tile_index ON tiles \
            (zoom_level, tile_column, tile_row);",
    )
    .unwrap();
    for (key, value) in [
        ("name", "roads"),
        ("format", "pbf"),
        ("scheme", "tms"),
        ("minzoom", "2"),
        ("maxzoom", "2"),
        ("bounds", "-180,-85,180,85"),
    ] {
        conn.execute(
            "INSERT INTO metadata VALUES (?1, ?2)",
            params![key, value],
        )
        .unwrap();
    }
    path
}

fn seed_tile(store: &MbtilesStore, coord: TileCoord) {
    let mut road = GeoFeature::new(Geometry::LineString(LineString::from(vec![
        (10.0, 10.0),
        (11.0, 11.0),
        (12.0, 10.5),
    ])));
    road.properties
        .insert("highway".to_string(), PropertyValue::String("trunk".to_string()));
    road.properties
        .insert("lanes".to_string(), PropertyValue::Int(2));

    let mut poi = GeoFeature::new(Geometry::Point(Point::new(11.0, 10.8)));
    poi.properties
        .insert("name".to_string(), PropertyValue::String("depot".to_string()));

    let mut layers = LayerSet::new();
    layers.insert("roads".to_string(), vec![road]);
    layers.insert("pois".to_string(), vec![poi]);

    let blob = encode(coord, &layers, &EncodeOptions::default()).unwrap();
    store.put_tile(coord, &blob).unwrap();
}

/// Options covering only the seeded tile 2/2/1.
fn seeded_tile_options() -> RunOptions {
    RunOptions {
        zoom: ZoomRange::single(2).unwrap(),
        bbox: GeoBounds::new(10.0, 10.0, 12.0, 11.0).unwrap(),
        ..RunOptions::default()
    }
}

#[tokio::test]
async fn test_edit_run_rewrites_tiles_in_place() {
    let dir = TempDir::new().unwrap();
    let path = create_dataset(&dir);

    // Tile 2/2/1 covers lon 0..90, lat 0..66; the seed features sit inside.
    let coord = TileCoord::new(2, 2, 1);
    {
        let store = MbtilesStore::open(&path).unwrap();
        seed_tile(&store, coord);
    }

    // Bump every road's lane count and drop the poi layer.
    let transform = Arc::new(FnTransform::new(|_, mut layers: LayerSet| {
        layers.remove("pois");
        for feature in layers.get_mut("roads").into_iter().flatten() {
            feature
                .properties
                .insert("lanes".to_string(), PropertyValue::Int(4));
        }
        Ok(Some(layers))
    }));

    let store = Arc::new(MbtilesStore::open(&path).unwrap());
    let report = run(store, transform, seeded_tile_options()).await.unwrap();
    assert_eq!(report.tiles_total, 1);
    assert_eq!(report.tiles_written, 1);

    // Re-open and inspect what actually landed in the file.
    let store = MbtilesStore::open(&path).unwrap();
    let blob = store.get_tile(coord).unwrap();
    let layers = decode(&blob, coord).unwrap();

    assert_eq!(layers.keys().collect::<Vec<_>>(), vec!["roads"]);
    let road = &layers["roads"][0];
    assert_eq!(
        road.properties.get("lanes"),
        Some(&PropertyValue::Int(4))
    );
    assert_eq!(
        road.properties.get("highway"),
        Some(&PropertyValue::String("trunk".to_string()))
    );

    // Geometry survives within grid quantization (one cell at extent
    // 4096 of a 90 degree tile is ~0.025 degrees).
    let Geometry::LineString(line) = &road.geometry else {
        panic!("expected a line, got {:?}", road.geometry);
    };
    assert_eq!(line.0.len(), 3);
    assert!((line.0[0].x - 10.0).abs() < 0.05);
    assert!((line.0[0].y - 10.0).abs() < 0.05);
    assert!((line.0[2].x - 12.0).abs() < 0.05);
}

#[tokio::test]
async fn test_no_change_run_leaves_bytes_identical() {
    let dir = TempDir::new().unwrap();
    let path = create_dataset(&dir);

    let coord = TileCoord::new(2, 2, 1);
    let original = {
        let store = MbtilesStore::open(&path).unwrap();
        seed_tile(&store, coord);
        store.get_tile(coord).unwrap()
    };

    let transform = Arc::new(FnTransform::new(|_, _| Ok(None)));
    let store = Arc::new(MbtilesStore::open(&path).unwrap());
    let report = run(store, transform, seeded_tile_options()).await.unwrap();
    assert_eq!(report.tiles_unchanged, 1);
    assert_eq!(report.tiles_written, 0);

    let store = MbtilesStore::open(&path).unwrap();
    assert_eq!(store.get_tile(coord).unwrap(), original);
}
