//! Transform engine: the seam the pipelines use for warping and gridding.

use tracing::info;

use crate::config::EngineConfig;
use crate::error::{GridProcessorError, Result};
use crate::gridding::{self, GridOptions};
use crate::types::Raster;
use crate::vector::PointLayer;
use crate::warp::{self, WarpOptions};

/// Raster transformations the pipelines depend on.
pub trait TransformEngine: Send + Sync {
    /// Reproject, resample and/or clip a raster.
    fn warp(&self, src: &Raster, options: &WarpOptions) -> Result<Raster>;

    /// Interpolate scattered points onto a regular grid.
    fn grid(&self, points: &PointLayer, options: &GridOptions) -> Result<Raster>;
}

/// In-process engine running on its own rayon pool.
pub struct NativeEngine {
    config: EngineConfig,
    pool: rayon::ThreadPool,
}

impl NativeEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate().map_err(GridProcessorError::ConfigError)?;

        let threads = config.effective_threads();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("hazard-worker-{}", i))
            .build()
            .map_err(|e| GridProcessorError::ConfigError(e.to_string()))?;

        info!(
            threads = threads,
            memory_limit_mb = config.memory_limit_mb,
            "Transform engine ready"
        );

        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl std::fmt::Debug for NativeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeEngine")
            .field("config", &self.config)
            .field("threads", &self.threads())
            .finish()
    }
}

impl TransformEngine for NativeEngine {
    fn warp(&self, src: &Raster, options: &WarpOptions) -> Result<Raster> {
        self.pool.install(|| warp::warp(src, options, &self.config))
    }

    fn grid(&self, points: &PointLayer, options: &GridOptions) -> Result<Raster> {
        self.pool.install(|| gridding::grid(points, options, &self.config))
    }
}
