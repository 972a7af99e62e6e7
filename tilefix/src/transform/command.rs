//! External command transform.
//!
//! Runs a user program once per tile. The decoded layers are written to
//! the program's stdin as a JSON object keyed by layer name, each value a
//! GeoJSON FeatureCollection. Whatever the program prints to stdout
//! replaces the tile; empty output or a JSON `null` means no change. The
//! tile address is passed in `TILE_Z`, `TILE_X` and `TILE_Y` environment
//! variables.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::coord::TileCoord;
use crate::features::geojson::{layers_from_json, layers_to_json};
use crate::features::LayerSet;

use super::{TileTransform, TransformError};

/// Transform that delegates tile editing to an external program.
pub struct CommandTransform {
    program: String,
    args: Vec<String>,
}

impl CommandTransform {
    /// Builds a transform from a shell-style command line. The first word
    /// is the program, the rest are arguments.
    pub fn new(command_line: &str) -> Self {
        let mut words = command_line.split_whitespace().map(str::to_string);
        let program = words.next().unwrap_or_default();
        Self {
            program,
            args: words.collect(),
        }
    }

    async fn run_once(
        &self,
        coord: TileCoord,
        layers: LayerSet,
    ) -> Result<Option<LayerSet>, TransformError> {
        let input = serde_json::to_vec(&layers_to_json(&layers))
            .map_err(|e| TransformError::Failed(e.to_string()))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .env("TILE_Z", coord.zoom.to_string())
            .env("TILE_X", coord.column.to_string())
            .env("TILE_Y", coord.row.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| TransformError::Spawn {
                command: self.program.clone(),
                source,
            })?;

        // Feed stdin while draining stdout, so a child that fills its
        // output pipe before reading its input cannot deadlock. A child
        // that exits without reading closes its end of the pipe; the
        // resulting broken-pipe write is not an error on our side.
        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                match stdin.write_all(&input).await {
                    Ok(()) => {}
                    Err(error) if error.kind() == std::io::ErrorKind::BrokenPipe => {}
                    Err(error) => return Err(error),
                }
                // Dropping stdin closes the pipe so the child sees EOF.
            }
            Ok(())
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;
        if !output.status.success() {
            return Err(TransformError::CommandFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        fed?;

        let stdout = output.stdout;
        if stdout.iter().all(u8::is_ascii_whitespace) {
            debug!(tile = %coord, "transform produced no output, keeping tile");
            return Ok(None);
        }

        let value: serde_json::Value = serde_json::from_slice(&stdout)
            .map_err(|e| TransformError::Failed(format!("invalid JSON on stdout: {}", e)))?;
        if value.is_null() {
            debug!(tile = %coord, "transform returned null, keeping tile");
            return Ok(None);
        }

        Ok(Some(layers_from_json(&value)?))
    }
}

impl TileTransform for CommandTransform {
    fn apply<'a>(
        &'a self,
        coord: TileCoord,
        layers: LayerSet,
    ) -> Pin<Box<dyn Future<Output = Result<Option<LayerSet>, TransformError>> + Send + 'a>> {
        Box::pin(self.run_once(coord, layers))
    }
}
