//! The constants and forecast pipelines.
//!
//! Both are fixed linear sequences: every step waits for the previous
//! step's raster, the first failure aborts the run and is returned as is.
//! Intermediates go to a per-run scratch area and are released as soon as
//! the next step has consumed them, or on the way out when a step fails.

use std::fmt;

use classification::ClassificationTable;
use grid_processor::{Boundary, RasterInfo, RasterLocation, RasterStore, TransformEngine};
use tracing::info;
use uuid::Uuid;

use crate::adapters::TransformAdapter;
use crate::error::Result;
use crate::scratch::ScratchArea;

/// States of the constants pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstantsState {
    Start,
    Clip,
    Classify,
    Done,
}

/// States of the forecast pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastState {
    Start,
    Reproject,
    Resample,
    Clip,
    Classify,
    Done,
}

/// Outcome of one successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport<S> {
    pub run_id: Uuid,
    /// States visited, `Start` through `Done`.
    pub states: Vec<S>,
    pub output: RasterInfo,
}

/// Records and logs state transitions of one run.
struct Transitions<S> {
    pipeline: &'static str,
    run_id: Uuid,
    states: Vec<S>,
}

impl<S: fmt::Debug + Copy> Transitions<S> {
    fn new(pipeline: &'static str, run_id: Uuid, start: S) -> Self {
        info!(pipeline, run_id = %run_id, state = ?start, "Pipeline started");
        Self {
            pipeline,
            run_id,
            states: vec![start],
        }
    }

    fn advance(&mut self, next: S) {
        if let Some(from) = self.states.last() {
            info!(
                pipeline = self.pipeline,
                run_id = %self.run_id,
                from = ?from,
                to = ?next,
                "Pipeline transition"
            );
        }
        self.states.push(next);
    }

    fn finish(self, output: RasterInfo) -> PipelineReport<S> {
        PipelineReport {
            run_id: self.run_id,
            states: self.states,
            output,
        }
    }
}

/// Clip a static raster to the boundary, then classify it.
#[derive(Clone, Copy)]
pub struct ConstantsPipeline<'a> {
    store: &'a RasterStore,
    transform: TransformAdapter<'a>,
}

impl<'a> ConstantsPipeline<'a> {
    pub fn new(store: &'a RasterStore, engine: &'a dyn TransformEngine) -> Self {
        Self {
            store,
            transform: TransformAdapter::new(store, engine),
        }
    }

    pub fn run(
        &self,
        input: &RasterLocation,
        boundary: &Boundary,
        table: &ClassificationTable,
        output: &RasterLocation,
    ) -> Result<PipelineReport<ConstantsState>> {
        let scratch = ScratchArea::new(self.store);
        let mut run = Transitions::new("constants", scratch.run_id(), ConstantsState::Start);

        run.advance(ConstantsState::Clip);
        let clipped = scratch.allocate("clip");
        self.transform.clip(input, boundary, clipped.location())?;

        run.advance(ConstantsState::Classify);
        let info = classification::classify(self.store, clipped.location(), output, table)?;
        clipped.release()?;

        run.advance(ConstantsState::Done);
        Ok(run.finish(info))
    }
}

/// Reproject, resample and clip a gridded forecast raster, then classify it.
#[derive(Clone, Copy)]
pub struct ForecastPipeline<'a> {
    store: &'a RasterStore,
    transform: TransformAdapter<'a>,
}

impl<'a> ForecastPipeline<'a> {
    pub fn new(store: &'a RasterStore, engine: &'a dyn TransformEngine) -> Self {
        Self {
            store,
            transform: TransformAdapter::new(store, engine),
        }
    }

    pub fn run(
        &self,
        input: &RasterLocation,
        boundary: &Boundary,
        table: &ClassificationTable,
        output: &RasterLocation,
    ) -> Result<PipelineReport<ForecastState>> {
        let scratch = ScratchArea::new(self.store);
        let mut run = Transitions::new("forecast", scratch.run_id(), ForecastState::Start);

        run.advance(ForecastState::Reproject);
        let reprojected = scratch.allocate("reproject");
        self.transform.reproject(input, reprojected.location())?;

        run.advance(ForecastState::Resample);
        let resampled = scratch.allocate("resample");
        self.transform
            .resample(reprojected.location(), resampled.location())?;
        reprojected.release()?;

        run.advance(ForecastState::Clip);
        let clipped = scratch.allocate("clip");
        self.transform
            .clip(resampled.location(), boundary, clipped.location())?;
        resampled.release()?;

        run.advance(ForecastState::Classify);
        let info = classification::classify(self.store, clipped.location(), output, table)?;
        clipped.release()?;

        run.advance(ForecastState::Done);
        Ok(run.finish(info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classification::standard_table;
    use grid_processor::{DataType, EngineConfig, GeoTransform, NativeEngine, Raster};
    use hazard_common::{Crs, Parameter};

    fn engine() -> NativeEngine {
        NativeEngine::new(EngineConfig::default()).unwrap()
    }

    fn boundary() -> Boundary {
        Boundary::from_geojson_str(
            r#"{"type": "Polygon", "coordinates": [[[330000, 3060000], [330300, 3060000], [330300, 3060300], [330000, 3060300], [330000, 3060000]]]}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_constants_states_and_cleanup() {
        let store = RasterStore::new();
        let engine = engine();
        let input = RasterLocation::scratch("slope");
        let gt = GeoTransform::north_up(330_000.0, 3_060_300.0, 30.0, 30.0);
        store
            .write(&input, Raster::filled(10, 10, gt, Some(Crs::UTM_45N), DataType::Float32, 20.0).unwrap())
            .unwrap();

        let output = RasterLocation::scratch("cls_slope");
        let report = ConstantsPipeline::new(&store, &engine)
            .run(&input, &boundary(), standard_table(Parameter::Slope), &output)
            .unwrap();

        assert_eq!(
            report.states,
            vec![
                ConstantsState::Start,
                ConstantsState::Clip,
                ConstantsState::Classify,
                ConstantsState::Done
            ]
        );
        assert_eq!(report.output.data_type, DataType::Int8);
        assert!(store.open(&output).unwrap().data.iter().all(|&v| v == 4.0));
        assert_eq!(store.scratch_names(), vec!["cls_slope".to_string(), "slope".to_string()]);
    }

    #[test]
    fn test_memory_ceiling_propagates() {
        let store = RasterStore::new();
        let engine = NativeEngine::new(EngineConfig {
            memory_limit_mb: 1,
            ..EngineConfig::default()
        })
        .unwrap();

        // The source band alone needs 2 MB
        let input = RasterLocation::scratch("tmax");
        let gt = GeoTransform::north_up(85.0, 28.0, 0.001, 0.001);
        store
            .write(&input, Raster::filled(512, 512, gt, Some(Crs::Wgs84), DataType::Float32, 20.0).unwrap())
            .unwrap();

        let err = ForecastPipeline::new(&store, &engine)
            .run(
                &input,
                &boundary(),
                standard_table(Parameter::Tmax),
                &RasterLocation::scratch("out"),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            crate::PipelineError::Raster(grid_processor::GridProcessorError::MemoryLimitExceeded { .. })
        ));
        assert_eq!(store.scratch_names(), vec!["tmax".to_string()]);
    }

    #[test]
    fn test_failed_clip_releases_intermediates() {
        let store = RasterStore::new();
        let engine = engine();
        let input = RasterLocation::scratch("rh");
        let gt = GeoTransform::north_up(85.27, 27.69, 0.01, 0.01);
        store
            .write(&input, Raster::filled(4, 4, gt, Some(Crs::Wgs84), DataType::Float32, 40.0).unwrap())
            .unwrap();

        let geographic = Boundary::from_geojson_str(
            r#"{"type": "Polygon", "crs": {"type": "name", "properties": {"name": "EPSG:4326"}}, "coordinates": [[[85.28, 27.66], [85.30, 27.66], [85.30, 27.68], [85.28, 27.66]]]}"#,
        )
        .unwrap();

        let output = RasterLocation::scratch("out");
        let err = ForecastPipeline::new(&store, &engine)
            .run(&input, &geographic, standard_table(Parameter::Rh), &output)
            .unwrap_err();
        assert!(matches!(
            err,
            crate::PipelineError::Raster(grid_processor::GridProcessorError::CrsMismatch { .. })
        ));
        assert!(!store.exists(&output));
        assert_eq!(store.scratch_names(), vec!["rh".to_string()]);
    }
}
