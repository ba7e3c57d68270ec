//! On-disk data layout.
//!
//! Raw sources live under the input folder, final layers under the output
//! folder, and classified static layers plus day artifacts under the
//! temporary folder.

use std::path::{Path, PathBuf};

use classification::ConfigError;
use hazard_common::Parameter;
use serde::{Deserialize, Serialize};

/// Raw static rasters, one per static parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticRasters {
    pub dem: PathBuf,
    pub slope: PathBuf,
    pub lulc: PathBuf,
    pub ndvi: PathBuf,
    pub road: PathBuf,
    pub settlement: PathBuf,
    pub aspect: PathBuf,
}

impl StaticRasters {
    /// Default file names (`{param}_utm45n.tif`) inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        let path = |p: Parameter| dir.join(format!("{}_utm45n.tif", p));
        Self {
            dem: path(Parameter::Dem),
            slope: path(Parameter::Slope),
            lulc: path(Parameter::Lulc),
            ndvi: path(Parameter::Ndvi),
            road: path(Parameter::Road),
            settlement: path(Parameter::Settlement),
            aspect: path(Parameter::Aspect),
        }
    }

    /// Raster for a static parameter; `None` for forecast parameters.
    pub fn get(&self, parameter: Parameter) -> Option<&Path> {
        let path = match parameter {
            Parameter::Dem => &self.dem,
            Parameter::Slope => &self.slope,
            Parameter::Lulc => &self.lulc,
            Parameter::Ndvi => &self.ndvi,
            Parameter::Road => &self.road,
            Parameter::Settlement => &self.settlement,
            Parameter::Aspect => &self.aspect,
            Parameter::Tmax | Parameter::Rh | Parameter::Ppt => return None,
        };
        Some(path)
    }
}

impl Default for StaticRasters {
    fn default() -> Self {
        Self::in_dir(Path::new("Input/Raw"))
    }
}

/// Folders and files the preparation workflow reads and writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataLayout {
    pub input: PathBuf,
    pub output: PathBuf,
    pub temporary: PathBuf,

    /// Boundary buffered by 3 km, used for clipping.
    pub buffered_boundary: PathBuf,
    /// Exact administrative boundary.
    pub exact_boundary: PathBuf,

    pub static_rasters: StaticRasters,

    /// Raw regional forecast export.
    pub forecast_table: PathBuf,
    /// Geographic raster whose extent and size the forecast grids copy.
    pub forecast_reference: PathBuf,
}

impl Default for DataLayout {
    fn default() -> Self {
        Self::rooted(Path::new("."))
    }
}

impl DataLayout {
    /// Default layout under `root`.
    pub fn rooted(root: &Path) -> Self {
        let input = root.join("Input");
        let raw = input.join("Raw");
        Self {
            output: root.join("Output"),
            temporary: input.join("temp"),
            buffered_boundary: raw.join("nepal_boundary_buffered_3km_utm45n.geojson"),
            exact_boundary: raw.join("nepal_boundary_exact_utm45n.geojson"),
            static_rasters: StaticRasters::in_dir(&raw),
            forecast_table: raw.join("forecast.csv"),
            forecast_reference: raw.join("forecast_reference_4326.tif"),
            input,
        }
    }

    /// Classified static layer: `{temporary}/cls_{param}.tif`.
    pub fn classified_raster(&self, parameter: Parameter) -> PathBuf {
        self.temporary.join(format!("cls_{}.tif", parameter))
    }

    /// Classified forecast layer: `{output}/{index}_day_{param}.tif`.
    pub fn forecast_output(&self, day_index: usize, parameter: Parameter) -> PathBuf {
        self.output.join(format!("{}_day_{}.tif", day_index, parameter))
    }

    /// Every missing folder or file, in declaration order.
    pub fn missing_paths(&self) -> Vec<String> {
        let mut missing = Vec::new();

        for folder in [&self.input, &self.output, &self.temporary] {
            if !folder.is_dir() {
                missing.push(format!("folder {}", folder.display()));
            }
        }

        let mut files: Vec<&Path> = vec![&self.buffered_boundary, &self.exact_boundary];
        files.extend(
            Parameter::STATIC
                .iter()
                .filter_map(|&p| self.static_rasters.get(p)),
        );
        files.push(&self.forecast_table);
        files.push(&self.forecast_reference);

        for file in files {
            if !file.is_file() {
                missing.push(format!("file {}", file.display()));
            }
        }
        missing
    }

    /// Fail listing every missing folder or file.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check("data layout", self.missing_paths())
    }
}
