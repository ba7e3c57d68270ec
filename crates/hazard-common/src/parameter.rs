//! Hazard parameters (the layers that get classified and weighted).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where a parameter's raster comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    /// Environmental layer prepared once (Constants Pipeline).
    Static,
    /// Daily weather layer gridded from forecast points (Forecast Pipeline).
    Forecast,
}

/// A hazard parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parameter {
    /// Elevation (m)
    Dem,
    /// Slope (degrees)
    Slope,
    /// Land use / land cover class
    Lulc,
    /// Vegetation index
    Ndvi,
    /// Distance to roads (m)
    Road,
    /// Distance to settlements (m)
    Settlement,
    /// Aspect (degrees clockwise from north)
    Aspect,
    /// Daily maximum temperature
    Tmax,
    /// Relative humidity (%)
    Rh,
    /// Precipitation (mm)
    Ppt,
}

impl Parameter {
    /// Static parameters in processing order.
    pub const STATIC: [Parameter; 7] = [
        Parameter::Dem,
        Parameter::Slope,
        Parameter::Lulc,
        Parameter::Ndvi,
        Parameter::Road,
        Parameter::Settlement,
        Parameter::Aspect,
    ];

    /// Forecast parameters in processing order.
    pub const FORECAST: [Parameter; 3] = [Parameter::Tmax, Parameter::Rh, Parameter::Ppt];

    /// Every parameter.
    pub const ALL: [Parameter; 10] = [
        Parameter::Dem,
        Parameter::Slope,
        Parameter::Lulc,
        Parameter::Ndvi,
        Parameter::Road,
        Parameter::Settlement,
        Parameter::Aspect,
        Parameter::Tmax,
        Parameter::Rh,
        Parameter::Ppt,
    ];

    /// Canonical short name, also used as the forecast column name.
    pub fn short_name(&self) -> &'static str {
        match self {
            Parameter::Dem => "dem",
            Parameter::Slope => "slope",
            Parameter::Lulc => "lulc",
            Parameter::Ndvi => "ndvi",
            Parameter::Road => "road",
            Parameter::Settlement => "settlement",
            Parameter::Aspect => "aspect",
            Parameter::Tmax => "tmax",
            Parameter::Rh => "rh",
            Parameter::Ppt => "ppt",
        }
    }

    pub fn kind(&self) -> ParameterKind {
        match self {
            Parameter::Tmax | Parameter::Rh | Parameter::Ppt => ParameterKind::Forecast,
            _ => ParameterKind::Static,
        }
    }

    /// Angular parameters wrap around at 360 degrees.
    pub fn is_angular(&self) -> bool {
        matches!(self, Parameter::Aspect)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for Parameter {
    type Err = UnknownParameter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Parameter::ALL
            .into_iter()
            .find(|p| p.short_name() == lower)
            .ok_or_else(|| UnknownParameter(s.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown parameter: {0}")]
pub struct UnknownParameter(pub String);
