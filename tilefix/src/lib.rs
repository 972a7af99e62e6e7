//! tilefix - batch editor for vector tile datasets
//!
//! This library edits MBTiles-style datasets of Mapbox vector tiles in
//! place: it resolves a zoom range and bounding box to a set of tiles,
//! decodes each tile to geographic features, hands them to a user
//! transform, and writes re-encoded tiles back inside one transaction.
//!
//! # High-Level API
//!
//! ```ignore
//! use std::sync::Arc;
//! use tilefix::pipeline::{run, RunOptions};
//! use tilefix::store::MbtilesStore;
//! use tilefix::transform::CommandTransform;
//!
//! let store = Arc::new(MbtilesStore::open(path)?);
//! let transform = Arc::new(CommandTransform::new("./fix-roads.sh"));
//! let report = run(store, transform, RunOptions::default()).await?;
//! ```

pub mod codec;
pub mod coord;
pub mod dataset;
pub mod features;
pub mod logging;
pub mod pipeline;
pub mod resolver;
pub mod store;
pub mod transform;

/// Version of the tilefix library and CLI.
///
/// Synchronized across the workspace and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
