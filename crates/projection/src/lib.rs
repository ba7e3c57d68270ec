//! Coordinate reference system transformations.
//!
//! Implements the map projections needed by the hazard pipelines from
//! scratch without external dependencies.

pub mod transform;
pub mod transverse_mercator;

pub use transform::CoordinateTransform;
pub use transverse_mercator::TransverseMercator;
