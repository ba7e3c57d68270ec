//! Error types for the preparation pipelines.

use classification::{ClassificationError, ConfigError};
use grid_processor::GridProcessorError;
use ingestion::IngestionError;
use thiserror::Error;

/// Any failure of a pipeline step, passed through unchanged.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Raster(#[from] GridProcessorError),

    #[error(transparent)]
    Classification(#[from] ClassificationError),

    #[error(transparent)]
    Ingestion(#[from] IngestionError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A static parameter has no raster configured in the data layout.
    #[error("no raw raster configured for {0}")]
    MissingInput(String),
}

impl PipelineError {
    /// True for open/read failures of a source raster.
    pub fn is_resource_error(&self) -> bool {
        match self {
            PipelineError::Raster(e) => e.is_resource_error(),
            PipelineError::Classification(ClassificationError::Raster(e)) => e.is_resource_error(),
            _ => false,
        }
    }
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
