//! Point-to-grid interpolation.

use hazard_common::{BoundingBox, Crs};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{GridProcessorError, Result};
use crate::types::{DataType, GeoTransform, Raster};
use crate::vector::{Point, PointLayer};
use crate::warp::check_memory;

/// Algorithm for filling a regular grid from scattered points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum GridAlgorithm {
    /// Inverse distance to a power.
    InverseDistance {
        power: f64,
        smoothing: f64,
        /// Search radius in map units; `None` uses every point.
        radius: Option<f64>,
        /// Cells with fewer points in range are left as nodata.
        min_points: usize,
    },
    /// Value of the closest point within the radius.
    NearestNeighbor { radius: Option<f64> },
}

impl Default for GridAlgorithm {
    fn default() -> Self {
        GridAlgorithm::InverseDistance {
            power: 2.0,
            smoothing: 0.0,
            radius: None,
            min_points: 0,
        }
    }
}

impl GridAlgorithm {
    /// Fewest points the algorithm can work with.
    pub fn required_points(&self) -> usize {
        match self {
            GridAlgorithm::InverseDistance { min_points, .. } => (*min_points).max(1),
            GridAlgorithm::NearestNeighbor { .. } => 1,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            GridAlgorithm::InverseDistance { .. } => "invdist",
            GridAlgorithm::NearestNeighbor { .. } => "nearest",
        }
    }
}

/// Output grid of an interpolation.
#[derive(Debug, Clone, PartialEq)]
pub struct GridOptions {
    pub algorithm: GridAlgorithm,
    pub bounds: BoundingBox,
    pub width: usize,
    pub height: usize,
    pub crs: Crs,
    pub nodata: f64,
    pub output_type: DataType,
}

impl GridOptions {
    pub fn geotransform(&self) -> GeoTransform {
        GeoTransform::north_up(
            self.bounds.min_x,
            self.bounds.max_y,
            self.bounds.width() / self.width as f64,
            self.bounds.height() / self.height as f64,
        )
    }
}

/// Interpolate a point layer onto the grid described by `options`.
///
/// Runs on the current rayon pool.
pub fn grid(layer: &PointLayer, options: &GridOptions, config: &EngineConfig) -> Result<Raster> {
    let required = options.algorithm.required_points();
    if layer.len() < required {
        return Err(GridProcessorError::InsufficientPoints {
            required,
            available: layer.len(),
        });
    }
    if options.width == 0 || options.height == 0 {
        return Err(GridProcessorError::invalid_raster("grid size must be non-zero"));
    }
    if layer.crs != options.crs {
        return Err(GridProcessorError::ProjectionError(format!(
            "point layer is in {} but the grid is in {}",
            layer.crs, options.crs
        )));
    }
    check_memory(layer.len() * 3, options.width * options.height, config)?;

    debug!(
        algorithm = options.algorithm.name(),
        points = layer.len(),
        width = options.width,
        height = options.height,
        "Gridding points"
    );

    let gt = options.geotransform();
    let algorithm = options.algorithm;
    let nodata = options.nodata;
    let output_type = options.output_type;
    let points = &layer.points;

    let mut data = vec![nodata; options.width * options.height];
    data.par_chunks_mut(options.width)
        .enumerate()
        .for_each(|(row, out_row)| {
            for (col, cell) in out_row.iter_mut().enumerate() {
                let (x, y) = gt.pixel_to_world(col as f64 + 0.5, row as f64 + 0.5);
                let value = match algorithm {
                    GridAlgorithm::InverseDistance {
                        power,
                        smoothing,
                        radius,
                        min_points,
                    } => inverse_distance(points, x, y, power, smoothing, radius, min_points),
                    GridAlgorithm::NearestNeighbor { radius } => nearest_point(points, x, y, radius),
                };
                if let Some(v) = value {
                    *cell = output_type.cast(v);
                }
            }
        });

    let raster = Raster::new(
        options.width,
        options.height,
        gt,
        Some(options.crs),
        output_type,
        data,
    )?;
    Ok(raster.with_nodata(Some(nodata)))
}

fn inverse_distance(
    points: &[Point],
    x: f64,
    y: f64,
    power: f64,
    smoothing: f64,
    radius: Option<f64>,
    min_points: usize,
) -> Option<f64> {
    let smoothing2 = smoothing * smoothing;
    let radius2 = radius.map(|r| r * r);
    let mut sum = 0.0;
    let mut weight = 0.0;
    let mut used = 0usize;

    for p in points {
        let d2 = (p.x - x).powi(2) + (p.y - y).powi(2);
        if radius2.is_some_and(|r2| d2 > r2) {
            continue;
        }
        let d2 = d2 + smoothing2;
        if d2 == 0.0 {
            // Cell center sits on a point
            return Some(p.z);
        }
        let w = 1.0 / d2.powf(power / 2.0);
        sum += w * p.z;
        weight += w;
        used += 1;
    }

    if used == 0 || used < min_points {
        None
    } else {
        Some(sum / weight)
    }
}

fn nearest_point(points: &[Point], x: f64, y: f64, radius: Option<f64>) -> Option<f64> {
    let radius2 = radius.map(|r| r * r);
    points
        .iter()
        .map(|p| ((p.x - x).powi(2) + (p.y - y).powi(2), p.z))
        .filter(|(d2, _)| radius2.map_or(true, |r2| *d2 <= r2))
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, z)| z)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(points: &[(f64, f64, f64)]) -> PointLayer {
        PointLayer::new(
            points.iter().map(|&(x, y, z)| Point { x, y, z }).collect(),
            Crs::Wgs84,
        )
    }

    fn options(algorithm: GridAlgorithm) -> GridOptions {
        GridOptions {
            algorithm,
            bounds: BoundingBox::new(0.0, 0.0, 4.0, 2.0),
            width: 4,
            height: 2,
            crs: Crs::Wgs84,
            nodata: -9999.0,
            output_type: DataType::Float32,
        }
    }

    #[test]
    fn test_empty_layer_is_insufficient() {
        let err = grid(&layer(&[]), &options(GridAlgorithm::default()), &EngineConfig::default())
            .unwrap_err();
        assert!(matches!(
            err,
            GridProcessorError::InsufficientPoints { required: 1, available: 0 }
        ));
    }

    #[test]
    fn test_min_points_requirement() {
        let algorithm = GridAlgorithm::InverseDistance {
            power: 2.0,
            smoothing: 0.0,
            radius: None,
            min_points: 3,
        };
        let pts = layer(&[(0.5, 0.5, 1.0), (1.5, 0.5, 2.0)]);
        let err = grid(&pts, &options(algorithm), &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, GridProcessorError::InsufficientPoints { required: 3, available: 2 }));
    }

    #[test]
    fn test_single_point_fills_grid() {
        let pts = layer(&[(1.0, 1.0, 30.0)]);
        let out = grid(&pts, &options(GridAlgorithm::default()), &EngineConfig::default()).unwrap();
        assert_eq!((out.width, out.height), (4, 2));
        assert_eq!(out.nodata, Some(-9999.0));
        assert_eq!(out.crs, Some(Crs::Wgs84));
        assert!(out.data.iter().all(|&v| v == 30.0));
    }

    #[test]
    fn test_idw_exact_at_points_and_between() {
        // Points on the centers of cells (0, 0) and (3, 0)
        let pts = layer(&[(0.5, 1.5, 10.0), (3.5, 1.5, 40.0)]);
        let out = grid(&pts, &options(GridAlgorithm::default()), &EngineConfig::default()).unwrap();

        assert_eq!(out.get(0, 0), Some(10.0));
        assert_eq!(out.get(3, 0), Some(40.0));
        // Cell (1, 0) is 1 unit from the first point and 2 from the second
        let expected = (10.0 * 1.0 + 40.0 * 0.25) / 1.25;
        assert_eq!(out.get(1, 0), Some(expected as f32 as f64));
    }

    #[test]
    fn test_nearest_with_radius() {
        let pts = layer(&[(0.5, 1.5, 7.0)]);
        let out = grid(
            &pts,
            &options(GridAlgorithm::NearestNeighbor { radius: Some(1.1) }),
            &EngineConfig::default(),
        )
        .unwrap();
        assert_eq!(out.get(0, 0), Some(7.0));
        assert_eq!(out.get(1, 0), Some(7.0));
        assert_eq!(out.get(3, 1), Some(-9999.0));
    }

    #[test]
    fn test_algorithm_from_yaml_style_json() {
        let algorithm: GridAlgorithm = serde_json::from_str(
            r#"{"algorithm": "nearest_neighbor", "radius": 0.5}"#,
        )
        .unwrap();
        assert_eq!(algorithm, GridAlgorithm::NearestNeighbor { radius: Some(0.5) });
    }
}
