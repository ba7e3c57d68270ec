//! Hazard layer classification.
//!
//! Converts continuous rasters into discrete risk classes using ordered
//! range tables, and holds the validated parameter weights used to combine
//! the classified layers.

pub mod classify;
pub mod error;
pub mod ranges;
pub mod tables;
pub mod weights;

pub use classify::{classify, classify_raster, CLASS_NODATA, DEFAULT_SOURCE_NODATA};
pub use error::{ClassificationError, ConfigError, Result};
pub use ranges::{ClassificationRange, ClassificationTable};
pub use tables::{standard_table, standard_tables};
pub use weights::{WeightConfig, WeightTable};
