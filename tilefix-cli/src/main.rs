//! tilefix CLI - batch edit vector tile datasets in place.
//!
//! This binary wires the tilefix library to the command line: it opens an
//! MBTiles file, resolves the requested tile range, and runs the given
//! transform command over every tile inside one transaction.

mod args;
mod error;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tilefix::codec::EncodeOptions;
use tilefix::logging::init_logging;
use tilefix::pipeline::{run, RunOptions};
use tilefix::store::MbtilesStore;
use tilefix::transform::CommandTransform;

use error::CliError;

#[derive(Parser)]
#[command(name = "tilefix")]
#[command(version = tilefix::VERSION)]
#[command(about = "Batch edit vector tiles in an MBTiles file", long_about = None)]
struct Args {
    /// Path to the MBTiles file to edit
    #[arg(short = 't', long = "tiles")]
    tiles: PathBuf,

    /// Transform command, run once per tile with layered GeoJSON on stdin
    #[arg(short = 's', long = "script")]
    script: String,

    /// Zoom level or range, e.g. "14" or "10-14"
    #[arg(short = 'z', long = "zoom", default_value = "0-24")]
    zoom: String,

    /// Bounding box west,south,east,north in degrees
    #[arg(short = 'b', long = "bbox", default_value = "-180,-90,180,90")]
    bbox: String,

    /// Number of tiles processed in parallel
    #[arg(long = "concurrency", default_value = "1")]
    concurrency: usize,

    /// Tile grid resolution used when re-encoding
    #[arg(long = "extent", default_value = "4096")]
    extent: u32,

    /// Geometry overlap kept beyond the tile edge when re-encoding
    #[arg(long = "buffer", default_value = "4096")]
    buffer: u32,

    /// Resolve and report the tile count without touching any tile
    #[arg(long = "dry-run")]
    dry_run: bool,

    /// Enable debug logging
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(error) = execute(args).await {
        error.exit();
    }
}

async fn execute(args: Args) -> Result<(), CliError> {
    let zoom = args::parse_zoom(&args.zoom);
    let bbox = args::parse_bbox(&args.bbox).map_err(CliError::Args)?;

    // Catch a bad script path before the store transaction opens. A bare
    // program name still resolves through PATH at spawn time.
    let program = args.script.split_whitespace().next().unwrap_or_default();
    if program.is_empty() || (program.contains('/') && !Path::new(program).is_file()) {
        return Err(CliError::Args(format!(
            "transform script not found: '{}'",
            args.script
        )));
    }

    let store = MbtilesStore::open(&args.tiles).map_err(CliError::StoreOpen)?;
    let transform = CommandTransform::new(&args.script);

    let options = RunOptions {
        zoom,
        bbox,
        concurrency: args.concurrency.max(1),
        encode: EncodeOptions {
            extent: args.extent,
            buffer: args.buffer,
        },
        dry_run: args.dry_run,
    };

    let report = run(Arc::new(store), Arc::new(transform), options)
        .await
        .map_err(CliError::Run)?;

    if args.dry_run {
        println!("{} tiles in range", report.tiles_total);
    } else {
        println!(
            "{} tiles processed: {} rewritten, {} unchanged",
            report.tiles_total, report.tiles_written, report.tiles_unchanged
        );
    }
    Ok(())
}
