//! Threshold classifier.

use grid_processor::{DataType, Raster, RasterInfo, RasterLocation, RasterStore};
use tracing::{debug, info};

use crate::error::Result;
use crate::ranges::ClassificationTable;

/// Class written for nodata and unmatched cells.
pub const CLASS_NODATA: i8 = -128;

/// Nodata assumed when the source declares none.
pub const DEFAULT_SOURCE_NODATA: f64 = -128.0;

/// Classify a raster in memory.
///
/// Output has the source's shape, georeferencing and CRS, Int8 cells and
/// nodata -128. Entries apply in table order and later matches override
/// earlier ones. Open-ended entries skip nodata cells, closed entries do
/// not; a final pass resets every nodata cell to -128 regardless.
pub fn classify_raster(src: &Raster, table: &ClassificationTable) -> Raster {
    let nodata = src.nodata.unwrap_or(DEFAULT_SOURCE_NODATA);
    let is_nodata = |v: f64| if nodata.is_nan() { v.is_nan() } else { v == nodata };
    let mut out = vec![CLASS_NODATA as f64; src.len()];

    for range in table.ranges() {
        let code = range.output_code() as f64;
        for (cell, &v) in out.iter_mut().zip(&src.data) {
            let nv = table.normalize(v);
            let hit = match (range.lower, range.upper) {
                (None, Some(upper)) => nv < upper && !is_nodata(v),
                (Some(lower), None) => nv >= lower && !is_nodata(v),
                (Some(lower), Some(upper)) => lower <= nv && nv < upper,
                (None, None) => false,
            };
            if hit {
                *cell = code;
            }
        }
    }

    let mut masked = 0usize;
    for (cell, &v) in out.iter_mut().zip(&src.data) {
        if is_nodata(v) {
            *cell = CLASS_NODATA as f64;
            masked += 1;
        }
    }

    debug!(
        parameter = %table.parameter(),
        cells = src.len(),
        nodata_cells = masked,
        "Classified raster"
    );

    Raster {
        width: src.width,
        height: src.height,
        geotransform: src.geotransform,
        crs: src.crs,
        nodata: Some(CLASS_NODATA as f64),
        data_type: DataType::Int8,
        data: out,
    }
}

/// Classify the raster at `input` and write the result to `output`.
///
/// Nothing is written when the input cannot be opened.
pub fn classify(
    store: &RasterStore,
    input: &RasterLocation,
    output: &RasterLocation,
    table: &ClassificationTable,
) -> Result<RasterInfo> {
    info!(
        parameter = %table.parameter(),
        input = %input,
        output = %output,
        "Classifying raster"
    );

    let src = store.open(input)?;
    let classified = classify_raster(&src, table);
    let info = classified.info();
    store.write(output, classified)?;
    Ok(info)
}
