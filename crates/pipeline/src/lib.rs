//! Preparation pipelines for wildfire hazard layers.
//!
//! Composes the transform engine, the classifier and the forecast splitter
//! into the two fixed pipelines and the complete preparation workflow.
//!
//! # Architecture
//!
//! ```text
//! static raster ──► Clip ──► Classify ──► {temporary}/cls_{param}.tif
//!
//! forecast CSV ──► split by day ──► {i}_day_forecast.csv
//!                                        │ grid (per parameter)
//!                                        ▼
//!        Reproject ──► Resample ──► Clip ──► Classify ──► {output}/{i}_day_{param}.tif
//! ```
//!
//! Intermediates live in the store's scratch area under a per-run prefix.

pub mod adapters;
pub mod error;
pub mod layout;
pub mod pipelines;
pub mod scratch;
pub mod workflow;

// Re-exports
pub use adapters::{
    GridAdapter, TransformAdapter, FORECAST_CRS, INTERMEDIATE_NODATA, TARGET_CRS,
    TARGET_RESOLUTION,
};
pub use error::{PipelineError, Result};
pub use layout::{DataLayout, StaticRasters};
pub use pipelines::{ConstantsPipeline, ConstantsState, ForecastPipeline, ForecastState, PipelineReport};
pub use scratch::{ScratchArea, ScratchRaster};
pub use workflow::{run_workflow, WorkflowOptions, WorkflowSummary};
