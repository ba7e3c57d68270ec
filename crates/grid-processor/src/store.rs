//! Raster store: GeoTIFF files on disk plus a named in-memory scratch area.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::error::{GridProcessorError, Result};
use crate::geotiff;
use crate::types::{Raster, RasterInfo, RasterLocation};

/// Opens and writes rasters by location.
///
/// File locations are GeoTIFFs. Scratch locations live in memory until
/// released. Everything holding the store shares one scratch area, so
/// concurrent runs must use distinct names.
#[derive(Debug, Default)]
pub struct RasterStore {
    scratch: Mutex<HashMap<String, Arc<Raster>>>,
}

impl RasterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a raster for reading.
    pub fn open(&self, location: &RasterLocation) -> Result<Arc<Raster>> {
        match location {
            RasterLocation::File(path) => Ok(Arc::new(geotiff::read_geotiff(path)?)),
            RasterLocation::Scratch(name) => self
                .scratch()?
                .get(name)
                .cloned()
                .ok_or_else(|| GridProcessorError::open_failed(format!("scratch:{}", name))),
        }
    }

    /// Describe an existing raster.
    pub fn info(&self, location: &RasterLocation) -> Result<RasterInfo> {
        Ok(self.open(location)?.info())
    }

    /// Write a raster, replacing anything already at the location.
    pub fn write(&self, location: &RasterLocation, raster: Raster) -> Result<()> {
        match location {
            RasterLocation::File(path) => geotiff::write_geotiff(path, &raster),
            RasterLocation::Scratch(name) => {
                debug!(
                    name = %name,
                    width = raster.width,
                    height = raster.height,
                    "Stored scratch raster"
                );
                self.scratch()?.insert(name.clone(), Arc::new(raster));
                Ok(())
            }
        }
    }

    /// Check whether a raster exists at the location.
    pub fn exists(&self, location: &RasterLocation) -> bool {
        match location {
            RasterLocation::File(path) => path.is_file(),
            RasterLocation::Scratch(name) => self
                .scratch()
                .map(|area| area.contains_key(name))
                .unwrap_or(false),
        }
    }

    /// Release a scratch raster.
    ///
    /// Files are left in place; releasing an unknown scratch name is an error.
    pub fn release(&self, location: &RasterLocation) -> Result<()> {
        match location {
            RasterLocation::File(_) => Ok(()),
            RasterLocation::Scratch(name) => {
                self.scratch()?
                    .remove(name)
                    .ok_or_else(|| GridProcessorError::ScratchNotFound(name.clone()))?;
                debug!(name = %name, "Released scratch raster");
                Ok(())
            }
        }
    }

    /// Names currently held in the scratch area, sorted.
    pub fn scratch_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .scratch()
            .map(|area| area.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    fn scratch(&self) -> Result<MutexGuard<'_, HashMap<String, Arc<Raster>>>> {
        self.scratch
            .lock()
            .map_err(|_| GridProcessorError::StorageError("scratch area lock poisoned".to_string()))
    }
}
