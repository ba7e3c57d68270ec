//! Coordinate Reference System types and utilities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate reference systems understood by the preparation pipelines.
///
/// Only WGS84 geographic coordinates and the WGS84 UTM zones are needed:
/// forecasts arrive as lat/lon points and every static layer is stored in
/// a UTM zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Crs {
    /// WGS84 geographic (EPSG:4326), degrees.
    Wgs84,
    /// WGS84 / UTM (EPSG:326zz north, EPSG:327zz south), meters.
    Utm { zone: u8, north: bool },
}

impl Crs {
    /// WGS 84 / UTM zone 45N, the projected system of the static layers.
    pub const UTM_45N: Crs = Crs::Utm {
        zone: 45,
        north: true,
    };

    /// Resolve an EPSG code.
    pub fn from_epsg(code: u32) -> Result<Self, CrsParseError> {
        match code {
            4326 => Ok(Crs::Wgs84),
            32601..=32660 => Ok(Crs::Utm {
                zone: (code - 32600) as u8,
                north: true,
            }),
            32701..=32760 => Ok(Crs::Utm {
                zone: (code - 32700) as u8,
                north: false,
            }),
            _ => Err(CrsParseError::UnsupportedCrs(format!("EPSG:{}", code))),
        }
    }

    /// Parse strings like "EPSG:32645", "epsg:4326" or "CRS:84".
    ///
    /// The OGC URN form used by GeoJSON (`urn:ogc:def:crs:EPSG::32645`)
    /// is accepted as well.
    pub fn parse(s: &str) -> Result<Self, CrsParseError> {
        let normalized = s.trim().to_uppercase();

        if normalized == "CRS:84" || normalized == "URN:OGC:DEF:CRS:OGC:1.3:CRS84" {
            return Ok(Crs::Wgs84);
        }

        let code = normalized
            .strip_prefix("EPSG:")
            .or_else(|| normalized.strip_prefix("URN:OGC:DEF:CRS:EPSG::"))
            .ok_or_else(|| CrsParseError::UnsupportedCrs(s.to_string()))?;

        let code: u32 = code
            .parse()
            .map_err(|_| CrsParseError::UnsupportedCrs(s.to_string()))?;

        Self::from_epsg(code)
    }

    /// EPSG code of this CRS.
    pub fn epsg(&self) -> u32 {
        match self {
            Crs::Wgs84 => 4326,
            Crs::Utm { zone, north: true } => 32600 + *zone as u32,
            Crs::Utm { zone, north: false } => 32700 + *zone as u32,
        }
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, Crs::Wgs84)
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}
