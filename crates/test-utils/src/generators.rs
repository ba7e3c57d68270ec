//! Test data generators for synthetic hazard inputs.
//!
//! These generators create predictable, verifiable rasters, forecast tables
//! and boundary files that can be used across the test suite.

use std::fmt::Write as _;
use std::path::Path;

use grid_processor::{DataType, GeoTransform, Raster};
use hazard_common::Crs;

use crate::fixtures::forecast::RAW_HEADER;
use crate::fixtures::grid::GridSpec;

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50);
/// assert_eq!(grid[1], 1000.0);  // col=1, row=0
/// assert_eq!(grid[10], 1.0);    // col=0, row=1
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f64);
        }
    }
    data
}

/// Creates an elevation-like grid rising from 500 m (west) to 4000 m (east).
pub fn create_elevation_grid(width: usize, height: usize) -> Vec<f64> {
    let span = (width.max(2) - 1) as f64;
    let mut data = Vec::with_capacity(width * height);
    for _row in 0..height {
        for col in 0..width {
            data.push(500.0 + 3500.0 * col as f64 / span);
        }
    }
    data
}

/// Creates an aspect grid sweeping 0..360 degrees across each row.
pub fn create_aspect_grid(width: usize, height: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for _row in 0..height {
        for col in 0..width {
            data.push(360.0 * col as f64 / width.max(1) as f64);
        }
    }
    data
}

/// Creates a grid filled with a constant value.
pub fn create_constant_grid(width: usize, height: usize, value: f64) -> Vec<f64> {
    vec![value; width * height]
}

/// Replaces every `nodata_every`-th cell with `nodata`.
pub fn with_nodata_cells(mut data: Vec<f64>, nodata_every: usize, nodata: f64) -> Vec<f64> {
    if nodata_every > 0 {
        for cell in data.iter_mut().step_by(nodata_every) {
            *cell = nodata;
        }
    }
    data
}

/// Builds a north-up raster over `spec`.
pub fn raster_on(spec: &GridSpec, crs: Crs, data: Vec<f64>, nodata: Option<f64>) -> Raster {
    let gt = GeoTransform::north_up(spec.min_x, spec.max_y, spec.pixel_size, spec.pixel_size);
    match Raster::new(spec.width, spec.height, gt, Some(crs), DataType::Float32, data) {
        Ok(raster) => raster.with_nodata(nodata),
        Err(e) => panic!("test raster does not match its grid spec: {}", e),
    }
}

/// Hex EWKB for a little-endian point with an SRID, as exported by PostGIS.
///
/// # Example
///
/// ```
/// use test_utils::encode_ewkb_point;
///
/// let hex = encode_ewkb_point(27.7, 85.3, 4326);
/// assert_eq!(&hex[..18], "0101000020E6100000");
/// ```
pub fn encode_ewkb_point(lat: f64, lon: f64, srid: u32) -> String {
    let mut bytes = vec![0x01];
    bytes.extend_from_slice(&0x2000_0001u32.to_le_bytes());
    bytes.extend_from_slice(&srid.to_le_bytes());
    bytes.extend_from_slice(&lon.to_le_bytes());
    bytes.extend_from_slice(&lat.to_le_bytes());

    let mut hex = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(hex, "{:02X}", b);
    }
    hex
}

/// One raw forecast observation.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRow {
    pub administrative_id: i64,
    pub start: String,
    pub end: String,
    pub ppt: f64,
    pub tmax: f64,
    pub rh: f64,
    pub ws: f64,
    pub lat: f64,
    pub lon: f64,
}

/// Builds raw forecast tables in the export layout.
#[derive(Debug, Clone, Default)]
pub struct ForecastCsvBuilder {
    rows: Vec<ForecastRow>,
}

impl ForecastCsvBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(mut self, row: ForecastRow) -> Self {
        self.rows.push(row);
        self
    }

    /// Adds one observation per point for `date` (YYYY-MM-DD).
    ///
    /// Point `i` gets administrative id `i + 1`.
    pub fn day(mut self, date: &str, points: &[(f64, f64)], ppt: f64, tmax: f64, rh: f64) -> Self {
        for (i, &(lat, lon)) in points.iter().enumerate() {
            self.rows.push(ForecastRow {
                administrative_id: i as i64 + 1,
                start: date.to_string(),
                end: date.to_string(),
                ppt,
                tmax,
                rh,
                ws: 2.0,
                lat,
                lon,
            });
        }
        self
    }

    pub fn build(&self) -> String {
        let mut csv = String::from(RAW_HEADER);
        csv.push('\n');
        for r in &self.rows {
            let _ = writeln!(
                csv,
                "{},{},{},{},{},{},{},{}",
                r.administrative_id,
                r.start,
                r.end,
                r.ppt,
                r.tmax,
                r.rh,
                r.ws,
                encode_ewkb_point(r.lat, r.lon, 4326)
            );
        }
        csv
    }

    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.build())
    }
}

/// GeoJSON FeatureCollection holding one rectangular polygon.
pub fn boundary_geojson(bbox: (f64, f64, f64, f64), crs: Option<&str>) -> String {
    let (min_x, min_y, max_x, max_y) = bbox;
    let mut doc = serde_json::json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[
                    [min_x, min_y], [max_x, min_y], [max_x, max_y], [min_x, max_y], [min_x, min_y]
                ]]
            }
        }]
    });
    if let Some(name) = crs {
        doc["crs"] = serde_json::json!({"type": "name", "properties": {"name": name}});
    }
    doc.to_string()
}

/// Writes [`boundary_geojson`] to `path`.
pub fn write_boundary_geojson(
    path: &Path,
    bbox: (f64, f64, f64, f64),
    crs: Option<&str>,
) -> std::io::Result<()> {
    std::fs::write(path, boundary_geojson(bbox, crs))
}
