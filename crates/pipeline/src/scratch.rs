//! Scoped scratch rasters.
//!
//! Every pipeline run draws its own [`ScratchArea`] with a random prefix, so
//! runs sharing a [`RasterStore`] never touch each other's intermediates.
//! A [`ScratchRaster`] releases its slot exactly once: explicitly through
//! [`ScratchRaster::release`] or, on early exit, when dropped.

use grid_processor::{RasterLocation, RasterStore};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::Result;

/// Namespace for one pipeline run's intermediates.
#[derive(Debug)]
pub struct ScratchArea<'a> {
    store: &'a RasterStore,
    run_id: Uuid,
}

impl<'a> ScratchArea<'a> {
    pub fn new(store: &'a RasterStore) -> Self {
        Self {
            store,
            run_id: Uuid::new_v4(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Reserve a scratch slot for one step's output.
    ///
    /// Nothing is stored until the step writes to the slot's location.
    pub fn allocate(&self, step: &str) -> ScratchRaster<'a> {
        let location = RasterLocation::scratch(format!("{}/{}.tif", self.run_id, step));
        debug!(location = %location, "Allocated scratch raster");
        ScratchRaster {
            store: self.store,
            location,
            released: false,
        }
    }
}

/// Guard over one scratch raster.
#[derive(Debug)]
pub struct ScratchRaster<'a> {
    store: &'a RasterStore,
    location: RasterLocation,
    released: bool,
}

impl ScratchRaster<'_> {
    pub fn location(&self) -> &RasterLocation {
        &self.location
    }

    /// Release the raster now.
    ///
    /// Fails when nothing was ever written to the slot.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.store.release(&self.location)?;
        Ok(())
    }
}

impl Drop for ScratchRaster<'_> {
    fn drop(&mut self) {
        if self.released || !self.store.exists(&self.location) {
            return;
        }
        if let Err(e) = self.store.release(&self.location) {
            warn!(location = %self.location, error = %e, "Failed to release scratch raster");
        }
    }
}
