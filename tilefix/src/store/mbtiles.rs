//! MBTiles store adapter.
//!
//! MBTiles is SQLite with a `metadata` key/value table and a `tiles`
//! table numbered in TMS rows (origin at the south edge). The adapter
//! converts between the XYZ rows the core uses and the stored TMS rows,
//! and maps the run-level transaction onto a SQLite transaction.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::debug;

use crate::coord::{GeoBounds, TileCoord, MAX_ZOOM, WORLD_BOUNDS};
use crate::dataset::{DatasetInfo, TileFormat};

use super::error::StoreError;
use super::TileStore;

/// Read-write MBTiles file.
pub struct MbtilesStore {
    conn: Mutex<Connection>,
    id: String,
}

impl MbtilesStore {
    /// Opens an existing MBTiles file read-write. The file must already
    /// exist; this tool edits datasets, it does not create them.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if !path.is_file() {
            return Err(StoreError::NotFound(PathBuf::from(path)));
        }
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_WRITE)
            .map_err(StoreError::Open)?;
        let id = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "mbtiles".to_string());
        debug!(store = %path.display(), "opened mbtiles");
        Ok(Self {
            conn: Mutex::new(conn),
            id,
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// MBTiles rows count from the south edge; the core counts from the
    /// north.
    fn flip_row(coord: TileCoord) -> i64 {
        ((1u64 << coord.zoom) - 1) as i64 - i64::from(coord.row)
    }

    fn metadata(conn: &Connection) -> Result<HashMap<String, String>, StoreError> {
        let mut stmt = conn.prepare("SELECT name, value FROM metadata")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut map = HashMap::new();
        for row in rows {
            let (name, value) = row?;
            map.insert(name, value);
        }
        Ok(map)
    }

    fn parse_bounds(metadata: &HashMap<String, String>) -> Result<GeoBounds, StoreError> {
        let Some(raw) = metadata.get("bounds") else {
            return Ok(WORLD_BOUNDS);
        };
        let parts: Vec<f64> = raw
            .split(',')
            .map(|v| v.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|e| StoreError::Metadata {
                key: "bounds",
                message: format!("'{}': {}", raw, e),
            })?;
        if parts.len() != 4 {
            return Err(StoreError::Metadata {
                key: "bounds",
                message: format!("'{}': expected four comma-separated values", raw),
            });
        }
        GeoBounds::new(parts[0], parts[1], parts[2], parts[3]).map_err(|e| StoreError::Metadata {
            key: "bounds",
            message: e.to_string(),
        })
    }

    fn parse_zoom(
        metadata: &HashMap<String, String>,
        key: &'static str,
    ) -> Result<Option<u8>, StoreError> {
        metadata
            .get(key)
            .map(|raw| {
                raw.trim().parse::<u8>().map_err(|e| StoreError::Metadata {
                    key,
                    message: format!("'{}': {}", raw, e),
                })
            })
            .transpose()
    }

    /// Zoom bounds from the tiles table, for files whose metadata omits
    /// minzoom/maxzoom.
    fn scan_zoom(conn: &Connection) -> Result<Option<(u8, u8)>, StoreError> {
        let range: Option<(Option<i64>, Option<i64>)> = conn
            .query_row(
                "SELECT MIN(zoom_level), MAX(zoom_level) FROM tiles",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(match range {
            Some((Some(min), Some(max))) => Some((min as u8, max as u8)),
            _ => None,
        })
    }
}

impl TileStore for MbtilesStore {
    fn info(&self) -> Result<DatasetInfo, StoreError> {
        let conn = self.conn();
        let metadata = Self::metadata(&conn)?;

        let format = metadata
            .get("format")
            .map(|v| TileFormat::parse(v))
            .unwrap_or_else(|| TileFormat::Other("unknown".to_string()));
        let scheme = metadata
            .get("scheme")
            .cloned()
            .unwrap_or_else(|| "tms".to_string());
        let bounds = Self::parse_bounds(&metadata)?;

        let metadata_min = Self::parse_zoom(&metadata, "minzoom")?;
        let metadata_max = Self::parse_zoom(&metadata, "maxzoom")?;
        let (minzoom, maxzoom) = match (metadata_min, metadata_max) {
            (Some(min), Some(max)) => (min, max),
            _ => Self::scan_zoom(&conn)?.unwrap_or((0, MAX_ZOOM)),
        };

        Ok(DatasetInfo {
            id: self.id.clone(),
            name: metadata.get("name").cloned().unwrap_or_else(|| self.id.clone()),
            format,
            scheme,
            minzoom,
            maxzoom,
            bounds,
        })
    }

    fn get_tile(&self, coord: TileCoord) -> Result<Vec<u8>, StoreError> {
        let conn = self.conn();
        conn.query_row(
            "SELECT tile_data FROM tiles WHERE zoom_level = ?1 AND tile_column = ?2 AND tile_row = ?3",
            params![coord.zoom, coord.column, Self::flip_row(coord)],
            |row| row.get(0),
        )
        .optional()?
        .ok_or(StoreError::TileNotFound(coord))
    }

    fn put_tile(&self, coord: TileCoord, blob: &[u8]) -> Result<(), StoreError> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO tiles (zoom_level, tile_column, tile_row, tile_data) \
             VALUES (?1, ?2, ?3, ?4)",
            params![coord.zoom, coord.column, Self::flip_row(coord), blob],
        )?;
        Ok(())
    }

    fn start_writing(&self) -> Result<(), StoreError> {
        self.conn().execute_batch("BEGIN")?;
        Ok(())
    }

    fn stop_writing(&self) -> Result<(), StoreError> {
        self.conn().execute_batch("COMMIT")?;
        Ok(())
    }

    fn abort_writing(&self) -> Result<(), StoreError> {
        self.conn().execute_batch("ROLLBACK")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_fixture(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
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
            ("name", "fixture"),
            ("format", "pbf"),
            ("scheme", "tms"),
            ("minzoom", "0"),
            ("maxzoom", "14"),
            ("bounds", "-10,-10,10,10"),
        ] {
            conn.execute(
                "INSERT INTO metadata (name, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .unwrap();
        }
        path
    }

    #[test]
    fn test_open_missing_file_is_precondition_error() {
        let dir = TempDir::new().unwrap();
        let result = MbtilesStore::open(&dir.path().join("absent.mbtiles"));
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_info_reads_metadata() {
        let dir = TempDir::new().unwrap();
        let path = create_fixture(&dir, "fixture.mbtiles");
        let store = MbtilesStore::open(&path).unwrap();

        let info = store.info().unwrap();
        assert_eq!(info.id, "fixture");
        assert_eq!(info.name, "fixture");
        assert_eq!(info.format, TileFormat::Pbf);
        assert_eq!(info.scheme, "tms");
        assert_eq!(info.minzoom, 0);
        assert_eq!(info.maxzoom, 14);
        assert_eq!(info.bounds, GeoBounds::new(-10.0, -10.0, 10.0, 10.0).unwrap());
    }

    #[test]
    fn test_get_tile_flips_rows() {
        let dir = TempDir::new().unwrap();
        let path = create_fixture(&dir, "fixture.mbtiles");
        {
            let conn = Connection::open(&path).unwrap();
            // XYZ 5/3/2 is stored as TMS row 29
            conn.execute(
                "INSERT INTO tiles VALUES (5, 3, 29, ?1)",
                params![b"blob".as_slice()],
            )
            .unwrap();
        }
        let store = MbtilesStore::open(&path).unwrap();
        assert_eq!(store.get_tile(TileCoord::new(5, 3, 2)).unwrap(), b"blob");
    }

    #[test]
    fn test_get_tile_absent() {
        let dir = TempDir::new().unwrap();
        let path = create_fixture(&dir, "fixture.mbtiles");
        let store = MbtilesStore::open(&path).unwrap();
        assert!(matches!(
            store.get_tile(TileCoord::new(5, 3, 2)),
            Err(StoreError::TileNotFound(_))
        ));
    }

    #[test]
    fn test_put_then_get_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = create_fixture(&dir, "fixture.mbtiles");
        let store = MbtilesStore::open(&path).unwrap();

        let coord = TileCoord::new(7, 60, 44);
        store.put_tile(coord, b"payload").unwrap();
        assert_eq!(store.get_tile(coord).unwrap(), b"payload");
    }

    #[test]
    fn test_abort_discards_writes() {
        let dir = TempDir::new().unwrap();
        let path = create_fixture(&dir, "fixture.mbtiles");
        let store = MbtilesStore::open(&path).unwrap();

        let coord = TileCoord::new(3, 1, 1);
        store.start_writing().unwrap();
        store.put_tile(coord, b"doomed").unwrap();
        store.abort_writing().unwrap();

        assert!(matches!(
            store.get_tile(coord),
            Err(StoreError::TileNotFound(_))
        ));
    }

    #[test]
    fn test_commit_keeps_writes() {
        let dir = TempDir::new().unwrap();
        let path = create_fixture(&dir, "fixture.mbtiles");
        let store = MbtilesStore::open(&path).unwrap();

        let coord = TileCoord::new(3, 1, 1);
        store.start_writing().unwrap();
        store.put_tile(coord, b"kept").unwrap();
        store.stop_writing().unwrap();

        assert_eq!(store.get_tile(coord).unwrap(), b"kept");
    }

    #[test]
    fn test_zoom_fallback_scans_tiles() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scan.mbtiles");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE metadata (name TEXT, value TEXT);
                 CREATE TABLE tiles (zoom_level INTEGER, tile_column INTEGER, \
                    tile_row INTEGER, tile_data BLOB);
                 INSERT INTO metadata VALUES ('format', 'pbf');
                 INSERT INTO tiles VALUES (4, 0, 0, x'00');
                 INSERT INTO tiles VALUES (9, 0, 0, x'00');",
            )
            .unwrap();
        }
        let store = MbtilesStore::open(&path).unwrap();
        let info = store.info().unwrap();
        assert_eq!(info.minzoom, 4);
        assert_eq!(info.maxzoom, 9);
        assert_eq!(info.bounds, WORLD_BOUNDS);
    }
}
