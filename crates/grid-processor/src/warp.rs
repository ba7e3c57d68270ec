//! Native warp: reprojection, resampling and clipping to a cutline.

use hazard_common::{BoundingBox, Crs};
use projection::CoordinateTransform;
use rayon::prelude::*;
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{GridProcessorError, Result};
use crate::interpolation::{self, Band};
use crate::types::{DataType, GeoTransform, Raster, ResampleAlg};
use crate::vector::Boundary;

/// Edge samples used when projecting the source extent.
const BOUNDS_DENSIFY: usize = 21;

/// Parameters of a warp.
///
/// Unset options inherit from the source raster.
#[derive(Debug, Clone, Default)]
pub struct WarpOptions {
    /// Override for the source CRS.
    pub src_crs: Option<Crs>,
    /// Output CRS.
    pub dst_crs: Option<Crs>,
    /// Override for the source nodata value.
    pub src_nodata: Option<f64>,
    /// Nodata value of the output.
    pub dst_nodata: Option<f64>,
    /// Output pixel size (x, y) in output map units.
    pub resolution: Option<(f64, f64)>,
    pub resample: ResampleAlg,
    pub output_type: Option<DataType>,
    /// Cells outside these polygons are set to nodata.
    pub cutline: Option<Boundary>,
    /// Shrink the output extent to the cutline's bounding box.
    pub crop_to_cutline: bool,
}

impl WarpOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_src_crs(mut self, crs: Crs) -> Self {
        self.src_crs = Some(crs);
        self
    }

    pub fn with_dst_crs(mut self, crs: Crs) -> Self {
        self.dst_crs = Some(crs);
        self
    }

    pub fn with_dst_nodata(mut self, nodata: f64) -> Self {
        self.dst_nodata = Some(nodata);
        self
    }

    pub fn with_resolution(mut self, x: f64, y: f64) -> Self {
        self.resolution = Some((x, y));
        self
    }

    pub fn with_resample(mut self, alg: ResampleAlg) -> Self {
        self.resample = alg;
        self
    }

    pub fn with_output_type(mut self, data_type: DataType) -> Self {
        self.output_type = Some(data_type);
        self
    }

    pub fn with_cutline(mut self, boundary: Boundary, crop: bool) -> Self {
        self.cutline = Some(boundary);
        self.crop_to_cutline = crop;
        self
    }
}

/// Output grid of a warp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarpGrid {
    pub crs: Crs,
    pub geotransform: GeoTransform,
    pub width: usize,
    pub height: usize,
}

/// Work out the output grid without touching any pixels.
pub fn plan(src: &Raster, options: &WarpOptions) -> Result<WarpGrid> {
    let src_crs = source_crs(src, options)?;
    let dst_crs = options.dst_crs.unwrap_or(src_crs);

    if let Some(cutline) = &options.cutline {
        if let Some(boundary_crs) = cutline.crs {
            if boundary_crs != dst_crs {
                return Err(GridProcessorError::CrsMismatch {
                    raster: dst_crs.to_string(),
                    boundary: boundary_crs.to_string(),
                });
            }
        }
    }

    let transform = CoordinateTransform::new(src_crs, dst_crs);
    let src_bounds = src.bounds();
    let projected = transform.transform_bounds(&src_bounds, BOUNDS_DENSIFY);

    let extent = match (&options.cutline, options.crop_to_cutline) {
        (Some(cutline), true) => cutline
            .bounds()
            .ok_or_else(|| GridProcessorError::invalid_geometry("cutline has no extent"))?,
        _ => projected,
    };

    let (res_x, res_y) = match options.resolution {
        Some((x, y)) => (x.abs(), y.abs()),
        None if transform.is_identity() => src.geotransform.resolution(),
        None => suggested_resolution(src, &projected),
    };

    if !(res_x > 0.0 && res_y > 0.0 && res_x.is_finite() && res_y.is_finite()) {
        return Err(GridProcessorError::ConfigError(format!(
            "invalid output resolution {}x{}",
            res_x, res_y
        )));
    }
    if !extent.is_valid() || extent.width() <= 0.0 || extent.height() <= 0.0 {
        return Err(GridProcessorError::invalid_raster(format!(
            "output extent {:?} is empty",
            extent
        )));
    }

    let width = ((extent.width() / res_x).round() as usize).max(1);
    let height = ((extent.height() / res_y).round() as usize).max(1);

    Ok(WarpGrid {
        crs: dst_crs,
        geotransform: GeoTransform::north_up(extent.min_x, extent.max_y, res_x, res_y),
        width,
        height,
    })
}

/// Warp a raster onto a new grid.
///
/// Runs on the current rayon pool; callers pick the pool.
pub fn warp(src: &Raster, options: &WarpOptions, config: &EngineConfig) -> Result<Raster> {
    let grid = plan(src, options)?;
    check_memory(src.len(), grid.width * grid.height, config)?;

    let src_crs = source_crs(src, options)?;
    let to_source = CoordinateTransform::new(grid.crs, src_crs);
    let src_nodata = options.src_nodata.or(src.nodata);
    let dst_nodata = options.dst_nodata.or(src_nodata);
    let output_type = options.output_type.unwrap_or(src.data_type);
    let fill = dst_nodata.unwrap_or(0.0);
    let band = Band::new(&src.data, src.width, src.height, src_nodata);
    let cutline = options.cutline.as_ref();

    debug!(
        src_crs = %src_crs,
        dst_crs = %grid.crs,
        width = grid.width,
        height = grid.height,
        resample = %options.resample,
        cutline = cutline.is_some(),
        "Warping raster"
    );

    let mut data = vec![fill; grid.width * grid.height];
    data.par_chunks_mut(grid.width)
        .enumerate()
        .for_each(|(row, out_row)| {
            let (_, y) = grid.geotransform.pixel_to_world(0.5, row as f64 + 0.5);
            let spans = cutline.map(|c| c.spans(y));

            for (col, cell) in out_row.iter_mut().enumerate() {
                let (x, y) = grid
                    .geotransform
                    .pixel_to_world(col as f64 + 0.5, row as f64 + 0.5);

                if let Some(spans) = &spans {
                    if !spans.iter().any(|&(start, end)| x >= start && x < end) {
                        continue;
                    }
                }

                let (sx, sy) = to_source.transform(x, y);
                let Some((px, py)) = src.geotransform.world_to_pixel(sx, sy) else {
                    continue;
                };
                if let Some(v) = interpolation::sample(options.resample, &band, px, py) {
                    *cell = output_type.cast(v);
                }
            }
        });

    let raster = Raster::new(
        grid.width,
        grid.height,
        grid.geotransform,
        Some(grid.crs),
        output_type,
        data,
    )?;
    Ok(raster.with_nodata(dst_nodata))
}

fn source_crs(src: &Raster, options: &WarpOptions) -> Result<Crs> {
    options
        .src_crs
        .or(src.crs)
        .ok_or_else(|| GridProcessorError::ProjectionError("source raster has no CRS".to_string()))
}

/// Square pixel size keeping the source's pixel count along the diagonal.
fn suggested_resolution(src: &Raster, projected: &BoundingBox) -> (f64, f64) {
    let src_diagonal_px = ((src.width * src.width + src.height * src.height) as f64).sqrt();
    let dst_diagonal = (projected.width().powi(2) + projected.height().powi(2)).sqrt();
    let res = dst_diagonal / src_diagonal_px;
    (res, res)
}

/// Fail when source plus destination buffers exceed the memory ceiling.
pub(crate) fn check_memory(src_cells: usize, dst_cells: usize, config: &EngineConfig) -> Result<()> {
    let required = (src_cells + dst_cells).saturating_mul(std::mem::size_of::<f64>());
    if required > config.memory_limit_bytes() {
        return Err(GridProcessorError::MemoryLimitExceeded {
            required_mb: required.div_ceil(1024 * 1024),
            limit_mb: config.memory_limit_mb,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::Polygon;

    fn utm_ramp(width: usize, height: usize) -> Raster {
        let gt = GeoTransform::north_up(300_000.0, 3_000_000.0 + height as f64 * 10.0, 10.0, 10.0);
        let data = (0..width * height).map(|i| (i % width) as f64).collect();
        Raster::new(width, height, gt, Some(Crs::UTM_45N), DataType::Float32, data)
            .unwrap()
            .with_nodata(Some(-9999.0))
    }

    #[test]
    fn test_identity_warp_keeps_grid() {
        let src = utm_ramp(6, 4);
        let out = warp(&src, &WarpOptions::new().with_resample(ResampleAlg::Nearest), &EngineConfig::default())
            .unwrap();
        assert_eq!(out.geotransform, src.geotransform);
        assert_eq!(out.data, src.data);
        assert_eq!(out.nodata, Some(-9999.0));
    }

    #[test]
    fn test_resample_to_coarser_pixels() {
        let src = utm_ramp(6, 6);
        let options = WarpOptions::new()
            .with_resolution(30.0, 30.0)
            .with_resample(ResampleAlg::Nearest);
        let out = warp(&src, &options, &EngineConfig::default()).unwrap();

        assert_eq!((out.width, out.height), (2, 2));
        assert_eq!(out.geotransform.resolution(), (30.0, 30.0));
        // Centers of the coarse cells fall in source columns 1 and 4
        assert_eq!(out.data, vec![1.0, 4.0, 1.0, 4.0]);
    }

    #[test]
    fn test_cutline_crop_and_mask() {
        let src = utm_ramp(10, 10);
        let triangle = Polygon::new(vec![vec![
            (300_020.0, 3_000_020.0),
            (300_080.0, 3_000_020.0),
            (300_020.0, 3_000_080.0),
            (300_020.0, 3_000_020.0),
        ]])
        .unwrap();
        let boundary = Boundary::new(vec![triangle], Some(Crs::UTM_45N)).unwrap();

        let options = WarpOptions::new()
            .with_resolution(10.0, 10.0)
            .with_resample(ResampleAlg::Nearest)
            .with_dst_nodata(-9999.0)
            .with_cutline(boundary, true);
        let out = warp(&src, &options, &EngineConfig::default()).unwrap();

        assert_eq!((out.width, out.height), (6, 6));
        assert_eq!(out.bounds(), BoundingBox::new(300_020.0, 3_000_020.0, 300_080.0, 3_000_080.0));
        // Bottom-left inside the triangle, top-right outside
        assert_eq!(out.get(0, 5), Some(2.0));
        assert_eq!(out.get(5, 0), Some(-9999.0));
    }

    #[test]
    fn test_cutline_crs_mismatch() {
        let src = utm_ramp(4, 4);
        let square = Polygon::rectangle(&BoundingBox::new(84.0, 27.0, 85.0, 28.0));
        let boundary = Boundary::new(vec![square], Some(Crs::Wgs84)).unwrap();
        let err = plan(&src, &WarpOptions::new().with_cutline(boundary, true)).unwrap_err();
        assert!(matches!(err, GridProcessorError::CrsMismatch { .. }));
    }

    #[test]
    fn test_reproject_geographic_to_utm() {
        let gt = GeoTransform::north_up(85.0, 28.0, 0.01, 0.01);
        let src = Raster::filled(20, 20, gt, Some(Crs::Wgs84), DataType::Float32, 25.0).unwrap();
        let options = WarpOptions::new()
            .with_dst_crs(Crs::UTM_45N)
            .with_resample(ResampleAlg::Bilinear);
        let out = warp(&src, &options, &EngineConfig::default()).unwrap();

        assert_eq!(out.crs, Some(Crs::UTM_45N));
        let (res, _) = out.geotransform.resolution();
        assert!(res > 900.0 && res < 1_200.0, "resolution {}", res);
        assert!(out.data.iter().any(|&v| v == 25.0));
        assert!(out.data.iter().all(|&v| v == 25.0 || v == 0.0));
    }

    #[test]
    fn test_memory_limit() {
        let config = EngineConfig {
            memory_limit_mb: 1,
            ..EngineConfig::default()
        };
        assert!(check_memory(1000, 1000, &config).is_ok());
        let err = check_memory(100_000, 100_000, &config).unwrap_err();
        assert!(matches!(
            err,
            GridProcessorError::MemoryLimitExceeded { required_mb: 2, limit_mb: 1 }
        ));
    }
}
