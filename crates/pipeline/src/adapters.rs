//! Fixed-parameter adapters over the transform engine.
//!
//! Each adapter reads one raster (or point table) from the store, runs one
//! engine operation and writes one raster back. The parameters are fixed
//! here; the engine decides how the work is done.

use std::path::Path;

use grid_processor::{
    Boundary, DataType, GridAlgorithm, GridOptions, PointBinding, PointLayer, RasterInfo,
    RasterLocation, RasterStore, ResampleAlg, TransformEngine, WarpOptions,
};
use hazard_common::{Crs, Parameter};
use tracing::{debug, info};

use crate::error::Result;

/// CRS of forecast points and the grids interpolated from them.
pub const FORECAST_CRS: Crs = Crs::Wgs84;

/// Projected CRS every layer ends up in (WGS 84 / UTM zone 45N).
pub const TARGET_CRS: Crs = Crs::UTM_45N;

/// Output pixel size in meters.
pub const TARGET_RESOLUTION: f64 = 30.0;

/// Nodata of every intermediate raster.
pub const INTERMEDIATE_NODATA: f64 = -9999.0;

/// Reproject, resample and clip through a transform engine.
#[derive(Clone, Copy)]
pub struct TransformAdapter<'a> {
    store: &'a RasterStore,
    engine: &'a dyn TransformEngine,
}

impl<'a> TransformAdapter<'a> {
    pub fn new(store: &'a RasterStore, engine: &'a dyn TransformEngine) -> Self {
        Self { store, engine }
    }

    /// Geographic to UTM 45N, bilinear, Float32.
    pub fn reproject(&self, input: &RasterLocation, output: &RasterLocation) -> Result<RasterInfo> {
        let options = WarpOptions::new()
            .with_src_crs(FORECAST_CRS)
            .with_dst_crs(TARGET_CRS)
            .with_dst_nodata(INTERMEDIATE_NODATA)
            .with_output_type(DataType::Float32)
            .with_resample(ResampleAlg::Bilinear);
        self.run("reproject", input, output, &options)
    }

    /// Resample to 30 m pixels with a cubic spline.
    pub fn resample(&self, input: &RasterLocation, output: &RasterLocation) -> Result<RasterInfo> {
        let options = WarpOptions::new()
            .with_src_crs(TARGET_CRS)
            .with_dst_crs(TARGET_CRS)
            .with_resolution(TARGET_RESOLUTION, TARGET_RESOLUTION)
            .with_dst_nodata(INTERMEDIATE_NODATA)
            .with_output_type(DataType::Float32)
            .with_resample(ResampleAlg::CubicSpline);
        self.run("resample", input, output, &options)
    }

    /// Mask to `boundary` and crop to its bounding box at 30 m.
    ///
    /// A boundary without a declared CRS is taken to be in UTM 45N.
    pub fn clip(
        &self,
        input: &RasterLocation,
        boundary: &Boundary,
        output: &RasterLocation,
    ) -> Result<RasterInfo> {
        let options = WarpOptions::new()
            .with_src_crs(TARGET_CRS)
            .with_dst_crs(TARGET_CRS)
            .with_resolution(TARGET_RESOLUTION, TARGET_RESOLUTION)
            .with_dst_nodata(INTERMEDIATE_NODATA)
            .with_output_type(DataType::Float32)
            .with_resample(ResampleAlg::Nearest)
            .with_cutline(boundary.clone(), true);
        self.run("clip", input, output, &options)
    }

    fn run(
        &self,
        step: &str,
        input: &RasterLocation,
        output: &RasterLocation,
        options: &WarpOptions,
    ) -> Result<RasterInfo> {
        let src = self.store.open(input)?;
        let warped = self.engine.warp(&src, options)?;
        let info = warped.info();
        debug!(
            step,
            input = %input,
            output = %output,
            width = info.width,
            height = info.height,
            "Warped raster"
        );
        self.store.write(output, warped)?;
        Ok(info)
    }
}

/// Interpolates a day's forecast points onto a reference grid.
#[derive(Clone, Copy)]
pub struct GridAdapter<'a> {
    store: &'a RasterStore,
    engine: &'a dyn TransformEngine,
    algorithm: GridAlgorithm,
}

impl<'a> GridAdapter<'a> {
    pub fn new(store: &'a RasterStore, engine: &'a dyn TransformEngine) -> Self {
        Self {
            store,
            engine,
            algorithm: GridAlgorithm::default(),
        }
    }

    pub fn with_algorithm(mut self, algorithm: GridAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Grid `parameter` from a day artifact over the extent and size of
    /// `reference`.
    ///
    /// The point count is not checked here; the engine reports too few points.
    pub fn grid_from_points(
        &self,
        day_csv: &Path,
        parameter: Parameter,
        reference: &RasterLocation,
        output: &RasterLocation,
    ) -> Result<RasterInfo> {
        let binding = PointBinding::lon_lat(parameter.short_name());
        let layer = PointLayer::from_csv(day_csv, &binding, FORECAST_CRS)?;
        let reference = self.store.info(reference)?;

        let options = GridOptions {
            algorithm: self.algorithm,
            bounds: reference.bounds,
            width: reference.width,
            height: reference.height,
            crs: FORECAST_CRS,
            nodata: INTERMEDIATE_NODATA,
            output_type: DataType::Float32,
        };

        info!(
            parameter = %parameter,
            source = %day_csv.display(),
            points = layer.len(),
            output = %output,
            "Gridding forecast points"
        );
        let raster = self.engine.grid(&layer, &options)?;
        let info = raster.info();
        self.store.write(output, raster)?;
        Ok(info)
    }
}
