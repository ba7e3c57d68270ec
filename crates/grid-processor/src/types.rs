//! Core types for raster processing.

use hazard_common::{BoundingBox, Crs};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{GridProcessorError, Result};

/// Affine mapping from pixel/line to map coordinates (GDAL ordering).
///
/// `x = c0 + col * c1 + row * c2`, `y = c3 + col * c4 + row * c5`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform(pub [f64; 6]);

impl GeoTransform {
    /// North-up transform from the top-left corner and pixel size.
    ///
    /// `pixel_height` is the (positive) cell height; rows run southwards.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self([origin_x, pixel_width, 0.0, origin_y, 0.0, -pixel_height])
    }

    pub fn origin(&self) -> (f64, f64) {
        (self.0[0], self.0[3])
    }

    /// Absolute pixel size (x, y) in map units.
    pub fn resolution(&self) -> (f64, f64) {
        (
            (self.0[1] * self.0[1] + self.0[4] * self.0[4]).sqrt(),
            (self.0[2] * self.0[2] + self.0[5] * self.0[5]).sqrt(),
        )
    }

    /// True when the transform has no rotation terms.
    pub fn is_north_up(&self) -> bool {
        self.0[2] == 0.0 && self.0[4] == 0.0
    }

    /// Map coordinates of a (fractional) pixel position.
    pub fn pixel_to_world(&self, col: f64, row: f64) -> (f64, f64) {
        let g = &self.0;
        (
            g[0] + col * g[1] + row * g[2],
            g[3] + col * g[4] + row * g[5],
        )
    }

    /// Fractional pixel position of map coordinates.
    ///
    /// Returns `None` when the transform is not invertible.
    pub fn world_to_pixel(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let g = &self.0;
        let det = g[1] * g[5] - g[2] * g[4];
        if det == 0.0 || !det.is_finite() {
            return None;
        }

        let dx = x - g[0];
        let dy = y - g[3];
        let col = (g[5] * dx - g[2] * dy) / det;
        let row = (-g[4] * dx + g[1] * dy) / det;
        Some((col, row))
    }

    /// Extent covered by a `width` x `height` grid.
    pub fn bounds(&self, width: usize, height: usize) -> BoundingBox {
        let (w, h) = (width as f64, height as f64);
        let corners = [
            self.pixel_to_world(0.0, 0.0),
            self.pixel_to_world(w, 0.0),
            self.pixel_to_world(0.0, h),
            self.pixel_to_world(w, h),
        ];
        // Four corners, never empty
        BoundingBox::from_points(corners)
            .unwrap_or_else(|| BoundingBox::new(self.0[0], self.0[3], self.0[0], self.0[3]))
    }
}

/// Storage type of raster cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    UInt8,
    Int8,
    UInt16,
    Int16,
    UInt32,
    Int32,
    Float32,
    Float64,
}

impl DataType {
    /// Bytes per cell.
    pub fn size_bytes(&self) -> usize {
        match self {
            DataType::UInt8 | DataType::Int8 => 1,
            DataType::UInt16 | DataType::Int16 => 2,
            DataType::UInt32 | DataType::Int32 | DataType::Float32 => 4,
            DataType::Float64 => 8,
        }
    }

    pub fn is_integer(&self) -> bool {
        !matches!(self, DataType::Float32 | DataType::Float64)
    }

    /// Representable range of the type.
    pub fn range(&self) -> (f64, f64) {
        match self {
            DataType::UInt8 => (u8::MIN as f64, u8::MAX as f64),
            DataType::Int8 => (i8::MIN as f64, i8::MAX as f64),
            DataType::UInt16 => (u16::MIN as f64, u16::MAX as f64),
            DataType::Int16 => (i16::MIN as f64, i16::MAX as f64),
            DataType::UInt32 => (u32::MIN as f64, u32::MAX as f64),
            DataType::Int32 => (i32::MIN as f64, i32::MAX as f64),
            DataType::Float32 => (f32::MIN as f64, f32::MAX as f64),
            DataType::Float64 => (f64::MIN, f64::MAX),
        }
    }

    /// Convert a computed value to what this type can hold.
    ///
    /// Integers round to nearest and saturate; Float32 loses precision.
    pub fn cast(&self, value: f64) -> f64 {
        match self {
            DataType::Float64 => value,
            DataType::Float32 => value as f32 as f64,
            _ => {
                if value.is_nan() {
                    return 0.0;
                }
                let (min, max) = self.range();
                value.round().clamp(min, max)
            }
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::UInt8 => "Byte",
            DataType::Int8 => "Int8",
            DataType::UInt16 => "UInt16",
            DataType::Int16 => "Int16",
            DataType::UInt32 => "UInt32",
            DataType::Int32 => "Int32",
            DataType::Float32 => "Float32",
            DataType::Float64 => "Float64",
        };
        f.write_str(name)
    }
}

/// A single-band raster held in memory.
///
/// Values are kept as `f64` regardless of the storage type so every
/// comparison happens on the widened value; `data_type` decides how the band
/// is encoded when written.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pub width: usize,
    pub height: usize,
    pub geotransform: GeoTransform,
    pub crs: Option<Crs>,
    pub nodata: Option<f64>,
    pub data_type: DataType,
    /// Row-major values, top row first.
    pub data: Vec<f64>,
}

impl Raster {
    /// Create a raster, checking the buffer length against the dimensions.
    pub fn new(
        width: usize,
        height: usize,
        geotransform: GeoTransform,
        crs: Option<Crs>,
        data_type: DataType,
        data: Vec<f64>,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(GridProcessorError::invalid_raster(format!(
                "raster must have non-zero size, got {}x{}",
                width, height
            )));
        }
        if data.len() != width * height {
            return Err(GridProcessorError::invalid_raster(format!(
                "buffer holds {} values but {}x{} raster needs {}",
                data.len(),
                width,
                height,
                width * height
            )));
        }

        Ok(Self {
            width,
            height,
            geotransform,
            crs,
            nodata: None,
            data_type,
            data,
        })
    }

    /// Create a raster with every cell set to `value`.
    pub fn filled(
        width: usize,
        height: usize,
        geotransform: GeoTransform,
        crs: Option<Crs>,
        data_type: DataType,
        value: f64,
    ) -> Result<Self> {
        Self::new(
            width,
            height,
            geotransform,
            crs,
            data_type,
            vec![value; width * height],
        )
    }

    /// Set the declared nodata value.
    pub fn with_nodata(mut self, nodata: Option<f64>) -> Self {
        self.nodata = nodata;
        self
    }

    /// Get the value at a specific grid coordinate.
    pub fn get(&self, col: usize, row: usize) -> Option<f64> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.data.get(row * self.width + col).copied()
    }

    /// Check whether a value equals the declared nodata value.
    pub fn is_nodata(&self, value: f64) -> bool {
        match self.nodata {
            Some(nd) if nd.is_nan() => value.is_nan(),
            Some(nd) => value == nd,
            None => false,
        }
    }

    /// Extent covered by the raster.
    pub fn bounds(&self) -> BoundingBox {
        self.geotransform.bounds(self.width, self.height)
    }

    /// Get the total number of cells.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the raster is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Descriptor of this raster.
    pub fn info(&self) -> RasterInfo {
        RasterInfo {
            width: self.width,
            height: self.height,
            bounds: self.bounds(),
            geotransform: self.geotransform,
            crs: self.crs,
            nodata: self.nodata,
            data_type: self.data_type,
        }
    }
}

/// Descriptor (extent, size, nodata) of an existing raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterInfo {
    pub width: usize,
    pub height: usize,
    pub bounds: BoundingBox,
    pub geotransform: GeoTransform,
    pub crs: Option<Crs>,
    pub nodata: Option<f64>,
    pub data_type: DataType,
}

/// Where a raster lives: a file on disk or a named scratch slot in memory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RasterLocation {
    File(PathBuf),
    Scratch(String),
}

impl RasterLocation {
    pub fn file(path: impl AsRef<Path>) -> Self {
        RasterLocation::File(path.as_ref().to_path_buf())
    }

    pub fn scratch(name: impl Into<String>) -> Self {
        RasterLocation::Scratch(name.into())
    }

    pub fn is_scratch(&self) -> bool {
        matches!(self, RasterLocation::Scratch(_))
    }
}

impl fmt::Display for RasterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RasterLocation::File(path) => write!(f, "{}", path.display()),
            RasterLocation::Scratch(name) => write!(f, "scratch:{}", name),
        }
    }
}

/// Resampling kernel used when warping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResampleAlg {
    /// Nearest neighbor (preserves exact values).
    Nearest,
    /// Bilinear interpolation (smooth, slight value changes).
    #[default]
    Bilinear,
    /// Bicubic (Catmull-Rom) interpolation.
    Cubic,
    /// Cubic B-spline (smoothing, never overshoots).
    CubicSpline,
}

impl ResampleAlg {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "nearest" | "near" => Self::Nearest,
            "cubic" | "bicubic" => Self::Cubic,
            "cubicspline" | "cubic_spline" => Self::CubicSpline,
            _ => Self::Bilinear,
        }
    }
}

impl fmt::Display for ResampleAlg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nearest => write!(f, "nearest"),
            Self::Bilinear => write!(f, "bilinear"),
            Self::Cubic => write!(f, "cubic"),
            Self::CubicSpline => write!(f, "cubicspline"),
        }
    }
}
