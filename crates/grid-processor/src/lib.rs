//! Raster processing layer for hazard layer preparation.
//!
//! This crate holds everything the pipelines need to touch pixels:
//!
//! - **Raster model**: single-band [`Raster`] with geotransform, CRS and nodata
//! - **Storage**: GeoTIFF files plus a named in-memory scratch area ([`RasterStore`])
//! - **Vector inputs**: point layers bound from tables, GeoJSON boundaries
//! - **Transform engine**: warp (reproject/resample/clip) and point gridding
//!   behind the [`TransformEngine`] trait, with [`NativeEngine`] running on a
//!   rayon pool sized from [`EngineConfig`]
//!
//! # Architecture
//!
//! ```text
//! RasterStore::open(location)
//!      │
//!      ▼
//! TransformEngine::warp(raster, WarpOptions)
//!      │
//!      ├─► Plan output grid (CRS, extent, resolution)
//!      │
//!      ├─► Check memory ceiling
//!      │
//!      └─► Per output row (parallel):
//!               ├─► Cutline spans
//!               ├─► Inverse-project pixel centers
//!               └─► Sample source kernel (nearest/bilinear/cubic/cubicspline)
//!      │
//!      ▼
//! RasterStore::write(location, raster)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use grid_processor::{EngineConfig, NativeEngine, RasterLocation, RasterStore, TransformEngine, WarpOptions};
//!
//! let store = RasterStore::new();
//! let engine = NativeEngine::new(EngineConfig::from_env())?;
//!
//! let src = store.open(&RasterLocation::file("Input/Raw/dem_utm45n.tif"))?;
//! let out = engine.warp(&src, &WarpOptions::new().with_resolution(30.0, 30.0))?;
//! store.write(&RasterLocation::scratch("run-1/dem"), out)?;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod geotiff;
pub mod gridding;
pub mod interpolation;
pub mod store;
pub mod types;
pub mod vector;
pub mod warp;

// Re-export commonly used types at crate root
pub use config::{EngineConfig, DEFAULT_MEMORY_LIMIT_MB};
pub use engine::{NativeEngine, TransformEngine};
pub use error::{GridProcessorError, Result};
pub use gridding::{GridAlgorithm, GridOptions};
pub use store::RasterStore;
pub use types::{DataType, GeoTransform, Raster, RasterInfo, RasterLocation, ResampleAlg};
pub use vector::{Boundary, Point, PointBinding, PointLayer, Polygon};
pub use warp::{WarpGrid, WarpOptions};
