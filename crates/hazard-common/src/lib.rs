//! Common types shared across the hazard preparation crates.

pub mod bbox;
pub mod crs;
pub mod parameter;

pub use bbox::BoundingBox;
pub use crs::{Crs, CrsParseError};
pub use parameter::{Parameter, ParameterKind, UnknownParameter};
