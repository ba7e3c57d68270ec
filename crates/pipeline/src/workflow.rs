//! The complete preparation run over a data layout.

use std::path::PathBuf;

use classification::{standard_table, WeightTable};
use grid_processor::{Boundary, GridAlgorithm, RasterLocation, RasterStore, TransformEngine};
use hazard_common::Parameter;
use ingestion::split_forecast_file;
use tracing::{info, warn};

use crate::adapters::GridAdapter;
use crate::error::{PipelineError, Result};
use crate::layout::DataLayout;
use crate::pipelines::{ConstantsPipeline, ForecastPipeline};
use crate::scratch::ScratchArea;

/// Which parts of the workflow to run.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowOptions {
    pub constants: bool,
    pub forecast: bool,
    pub grid_algorithm: GridAlgorithm,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            constants: true,
            forecast: true,
            grid_algorithm: GridAlgorithm::default(),
        }
    }
}

/// What a workflow run produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowSummary {
    /// Classified static layers.
    pub constants: Vec<PathBuf>,
    pub days_completed: usize,
    pub days_total: usize,
    /// Why day splitting stopped early, if it did.
    pub split_stop_reason: Option<String>,
    /// Classified forecast layers.
    pub forecast_layers: Vec<PathBuf>,
}

/// Run the preparation workflow.
///
/// The layout and weights are validated first; any later failure aborts
/// the run with that failure.
pub fn run_workflow(
    layout: &DataLayout,
    weights: &WeightTable,
    engine: &dyn TransformEngine,
    options: &WorkflowOptions,
) -> Result<WorkflowSummary> {
    layout.validate()?;
    info!(
        total = weights.total(),
        ppt_enabled = weights.ppt_enabled(),
        "Weights validated"
    );

    let store = RasterStore::new();
    let boundary = Boundary::from_geojson_file(&layout.buffered_boundary)?;
    let mut summary = WorkflowSummary::default();

    if options.constants {
        summary.constants = run_constants(layout, &store, engine, &boundary)?;
    }

    if options.forecast {
        run_forecast(layout, &store, engine, &boundary, options, &mut summary)?;
    }

    info!(
        constants = summary.constants.len(),
        days_completed = summary.days_completed,
        days_total = summary.days_total,
        forecast_layers = summary.forecast_layers.len(),
        "Preparation finished"
    );
    Ok(summary)
}

fn run_constants(
    layout: &DataLayout,
    store: &RasterStore,
    engine: &dyn TransformEngine,
    boundary: &Boundary,
) -> Result<Vec<PathBuf>> {
    let pipeline = ConstantsPipeline::new(store, engine);
    let mut produced = Vec::with_capacity(Parameter::STATIC.len());

    for parameter in Parameter::STATIC {
        let raw = layout
            .static_rasters
            .get(parameter)
            .ok_or_else(|| PipelineError::MissingInput(parameter.to_string()))?;
        let output = layout.classified_raster(parameter);

        pipeline.run(
            &RasterLocation::file(raw),
            boundary,
            standard_table(parameter),
            &RasterLocation::file(&output),
        )?;
        info!(parameter = %parameter, output = %output.display(), "Static layer classified");
        produced.push(output);
    }
    Ok(produced)
}

fn run_forecast(
    layout: &DataLayout,
    store: &RasterStore,
    engine: &dyn TransformEngine,
    boundary: &Boundary,
    options: &WorkflowOptions,
    summary: &mut WorkflowSummary,
) -> Result<()> {
    let split = split_forecast_file(&layout.forecast_table, &layout.temporary)?;
    summary.days_completed = split.completed();
    summary.days_total = split.total_days;
    if let Some(reason) = &split.stop_reason {
        warn!(
            completed = split.completed(),
            total = split.total_days,
            reason = %reason,
            "Continuing with the days that were written"
        );
        summary.split_stop_reason = Some(reason.clone());
    }

    let grid = GridAdapter::new(store, engine).with_algorithm(options.grid_algorithm);
    let pipeline = ForecastPipeline::new(store, engine);
    let reference = RasterLocation::file(&layout.forecast_reference);

    for day in &split.days {
        for parameter in Parameter::FORECAST {
            let scratch = ScratchArea::new(store);
            let gridded = scratch.allocate(&format!("{}_day_{}", day.index, parameter));
            grid.grid_from_points(&day.path, parameter, &reference, gridded.location())?;

            let output = layout.forecast_output(day.index, parameter);
            pipeline.run(
                gridded.location(),
                boundary,
                standard_table(parameter),
                &RasterLocation::file(&output),
            )?;
            gridded.release()?;

            info!(
                day = day.index,
                date = %day.date,
                parameter = %parameter,
                output = %output.display(),
                "Forecast layer classified"
            );
            summary.forecast_layers.push(output);
        }
    }
    Ok(())
}
