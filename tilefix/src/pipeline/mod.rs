//! Batch edit pipeline.
//!
//! Drives one run end to end: read the dataset metadata, resolve the tile
//! range, then walk every tile through decode, transform and re-encode.
//! All writes happen inside a single store transaction; the first error on
//! any tile cancels the remaining work and rolls the transaction back, so
//! a failed run leaves the dataset untouched.

mod error;

pub use error::PipelineError;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::codec::{self, EncodeOptions};
use crate::coord::{GeoBounds, TileCoord, ZoomRange};
use crate::resolver::{self, ResolvedRange};
use crate::store::TileStore;
use crate::transform::TileTransform;

/// Per-run settings.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub zoom: ZoomRange,
    pub bbox: GeoBounds,
    /// Worker count. The default of 1 keeps tile order deterministic.
    pub concurrency: usize,
    pub encode: EncodeOptions,
    /// Resolve and report the tile count, then stop before any tile work.
    pub dry_run: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            zoom: ZoomRange::full(),
            bbox: crate::coord::WORLD_BOUNDS,
            concurrency: 1,
            encode: EncodeOptions::default(),
            dry_run: false,
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub tiles_total: u64,
    pub tiles_written: u64,
    pub tiles_unchanged: u64,
}

/// Shared state for the worker pool.
struct RunState {
    queue: Mutex<VecDeque<TileCoord>>,
    cancel: CancellationToken,
    failure: Mutex<Option<PipelineError>>,
    written: Mutex<u64>,
    unchanged: Mutex<u64>,
}

impl RunState {
    fn new(coords: VecDeque<TileCoord>) -> Self {
        Self {
            queue: Mutex::new(coords),
            cancel: CancellationToken::new(),
            failure: Mutex::new(None),
            written: Mutex::new(0),
            unchanged: Mutex::new(0),
        }
    }

    fn next_job(&self) -> Option<TileCoord> {
        if self.cancel.is_cancelled() {
            return None;
        }
        lock(&self.queue).pop_front()
    }

    fn fail(&self, error: PipelineError) {
        let mut slot = lock(&self.failure);
        if slot.is_none() {
            *slot = Some(error);
        }
        self.cancel.cancel();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs one batch edit over `store` with `transform`.
///
/// # Errors
///
/// Returns the first error encountered; the store transaction is rolled
/// back before returning, so no partial edit survives.
pub async fn run(
    store: Arc<dyn TileStore>,
    transform: Arc<dyn TileTransform>,
    options: RunOptions,
) -> Result<RunReport, PipelineError> {
    let info = store.info()?;
    info!(
        dataset = %info.name,
        format = %info.format,
        scheme = %info.scheme,
        zoom = %options.zoom,
        "starting edit run"
    );

    let resolved = resolver::resolve(&info, options.zoom, options.bbox)?;
    let total = resolved.tile_count();
    info!(tiles = total, zoom = %resolved.zoom, "resolved tile range");

    if options.dry_run {
        return Ok(RunReport {
            tiles_total: total,
            ..RunReport::default()
        });
    }
    if total == 0 {
        return Ok(RunReport::default());
    }

    store.start_writing()?;
    let result = run_workers(&store, &transform, &resolved, &options).await;
    match result {
        Ok(report) => {
            store.stop_writing()?;
            info!(
                written = report.tiles_written,
                unchanged = report.tiles_unchanged,
                "edit run committed"
            );
            Ok(report)
        }
        Err(error) => {
            // Best effort; the original failure is the one worth reporting.
            if let Err(rollback) = store.abort_writing() {
                debug!(error = %rollback, "rollback failed");
            }
            Err(error)
        }
    }
}

async fn run_workers(
    store: &Arc<dyn TileStore>,
    transform: &Arc<dyn TileTransform>,
    resolved: &ResolvedRange,
    options: &RunOptions,
) -> Result<RunReport, PipelineError> {
    let total = resolved.tile_count();
    let state = Arc::new(RunState::new(resolved.coords().collect()));
    let workers = options.concurrency.max(1);

    let mut handles = Vec::with_capacity(workers);
    for _ in 0..workers {
        let state = Arc::clone(&state);
        let store = Arc::clone(store);
        let transform = Arc::clone(transform);
        let encode_options = options.encode;
        handles.push(tokio::spawn(async move {
            while let Some(coord) = state.next_job() {
                match process_tile(&*store, &*transform, coord, &encode_options).await {
                    Ok(TileOutcome::Written) => *lock(&state.written) += 1,
                    Ok(TileOutcome::Unchanged) => *lock(&state.unchanged) += 1,
                    Err(error) => {
                        state.fail(error);
                        return;
                    }
                }
            }
        }));
    }

    for handle in handles {
        if let Err(join_error) = handle.await {
            state.fail(PipelineError::Worker(join_error.to_string()));
        }
    }

    if let Some(error) = lock(&state.failure).take() {
        return Err(error);
    }
    let tiles_written = *lock(&state.written);
    let tiles_unchanged = *lock(&state.unchanged);
    Ok(RunReport {
        tiles_total: total,
        tiles_written,
        tiles_unchanged,
    })
}

enum TileOutcome {
    Written,
    Unchanged,
}

async fn process_tile(
    store: &dyn TileStore,
    transform: &dyn TileTransform,
    coord: TileCoord,
    encode_options: &EncodeOptions,
) -> Result<TileOutcome, PipelineError> {
    let blob = store.get_tile(coord)?;
    let layers =
        codec::decode(&blob, coord).map_err(|source| PipelineError::Codec { coord, source })?;

    let replacement = transform
        .apply(coord, layers)
        .await
        .map_err(|source| PipelineError::Transform { coord, source })?;

    let Some(layers) = replacement else {
        debug!(tile = %coord, "unchanged");
        return Ok(TileOutcome::Unchanged);
    };

    let encoded = codec::encode(coord, &layers, encode_options)
        .map_err(|source| PipelineError::Codec { coord, source })?;
    store.put_tile(coord, &encoded)?;
    debug!(tile = %coord, bytes = encoded.len(), "rewritten");
    Ok(TileOutcome::Written)
}
