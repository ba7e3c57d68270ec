//! Error types for grid processing.

use thiserror::Error;

/// Errors that can occur while reading, writing or transforming rasters.
#[derive(Error, Debug)]
pub enum GridProcessorError {
    /// Failed to open the raster source.
    #[error("failed to open raster: {0}")]
    OpenFailed(String),

    /// The source opened but has no single readable band.
    #[error("no readable band in {0}")]
    MissingBand(String),

    /// Failed to read data from the raster.
    #[error("failed to read raster data: {0}")]
    ReadFailed(String),

    /// Failed to write the raster.
    #[error("failed to write raster: {0}")]
    WriteFailed(String),

    /// Raster dimensions or buffers are inconsistent.
    #[error("invalid raster: {0}")]
    InvalidRaster(String),

    /// Projection error.
    #[error("projection error: {0}")]
    ProjectionError(String),

    /// Raster and boundary are in different coordinate systems.
    #[error("raster CRS {raster} does not match boundary CRS {boundary}")]
    CrsMismatch { raster: String, boundary: String },

    /// Boundary geometry could not be used.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A field required by a point layer binding is missing.
    #[error("invalid field binding: {0}")]
    InvalidField(String),

    /// Interpolation error.
    #[error("interpolation error: {0}")]
    InterpolationError(String),

    /// The point layer cannot feed the chosen gridding algorithm.
    #[error("insufficient points for interpolation: {available} available, {required} required")]
    InsufficientPoints { required: usize, available: usize },

    /// The estimated working set exceeds the configured memory ceiling.
    #[error("operation needs ~{required_mb} MB which exceeds the {limit_mb} MB memory limit")]
    MemoryLimitExceeded { required_mb: usize, limit_mb: usize },

    /// A scratch raster name is unknown.
    #[error("scratch raster not found: {0}")]
    ScratchNotFound(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Storage/IO error.
    #[error("storage error: {0}")]
    StorageError(String),
}

impl GridProcessorError {
    /// Create an OpenFailed error.
    pub fn open_failed(msg: impl Into<String>) -> Self {
        Self::OpenFailed(msg.into())
    }

    /// Create a ReadFailed error.
    pub fn read_failed(msg: impl Into<String>) -> Self {
        Self::ReadFailed(msg.into())
    }

    /// Create a WriteFailed error.
    pub fn write_failed(msg: impl Into<String>) -> Self {
        Self::WriteFailed(msg.into())
    }

    /// Create an InvalidRaster error.
    pub fn invalid_raster(msg: impl Into<String>) -> Self {
        Self::InvalidRaster(msg.into())
    }

    /// Create an InvalidGeometry error.
    pub fn invalid_geometry(msg: impl Into<String>) -> Self {
        Self::InvalidGeometry(msg.into())
    }

    /// True for failures to access the source raster itself.
    pub fn is_resource_error(&self) -> bool {
        matches!(self, Self::OpenFailed(_) | Self::MissingBand(_) | Self::ReadFailed(_))
    }
}

impl From<std::io::Error> for GridProcessorError {
    fn from(err: std::io::Error) -> Self {
        Self::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for GridProcessorError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidGeometry(err.to_string())
    }
}

impl From<csv::Error> for GridProcessorError {
    fn from(err: csv::Error) -> Self {
        Self::ReadFailed(err.to_string())
    }
}

/// Result type for grid processor operations.
pub type Result<T> = std::result::Result<T, GridProcessorError>;
