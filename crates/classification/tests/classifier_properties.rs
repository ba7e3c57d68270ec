//! Classifier properties checked over whole rasters and files.

use classification::{
    classify, classify_raster, standard_table, ClassificationRange, ClassificationTable,
    CLASS_NODATA,
};
use grid_processor::{DataType, GeoTransform, Raster, RasterLocation, RasterStore};
use hazard_common::{Crs, Parameter};

fn slope_ramp() -> Raster {
    let gt = GeoTransform::north_up(340_000.0, 3_070_000.0, 30.0, 30.0);
    let data: Vec<f64> = (0..64)
        .map(|i| if i % 9 == 0 { -9999.0 } else { i as f64 * 0.75 })
        .collect();
    Raster::new(8, 8, gt, Some(Crs::UTM_45N), DataType::Float32, data)
        .unwrap()
        .with_nodata(Some(-9999.0))
}

#[test]
fn test_matches_last_matching_entry_for_every_cell() {
    let src = slope_ramp();
    let table = standard_table(Parameter::Slope);
    let out = classify_raster(&src, table);

    for (&v, &c) in src.data.iter().zip(&out.data) {
        if src.is_nodata(v) {
            assert_eq!(c, CLASS_NODATA as f64);
        } else {
            let expected = table.class_for(v).map_or(CLASS_NODATA, |class| class.trunc() as i8);
            assert_eq!(c, expected as f64, "value {}", v);
        }
    }
}

#[test]
fn test_reclassifying_with_identity_table_is_idempotent() {
    let once = classify_raster(&slope_ramp(), standard_table(Parameter::Slope));

    let identity: Vec<_> = standard_table(Parameter::Slope)
        .output_codes()
        .into_iter()
        .map(|c| ClassificationRange::between(c as f64, c as f64 + 1.0, c as f64))
        .collect();
    let table = ClassificationTable::new(Parameter::Slope, identity).unwrap();

    let twice = classify_raster(&once, &table);
    assert_eq!(twice, once);
}

#[test]
fn test_overlapping_entries_follow_table_order() {
    let src = slope_ramp();
    let forward = ClassificationTable::new(
        Parameter::Slope,
        vec![
            ClassificationRange::between(0.0, 30.0, 1.0),
            ClassificationRange::between(10.0, 20.0, 2.0),
        ],
    )
    .unwrap();
    let reversed = ClassificationTable::new(
        Parameter::Slope,
        vec![
            ClassificationRange::between(10.0, 20.0, 2.0),
            ClassificationRange::between(0.0, 30.0, 1.0),
        ],
    )
    .unwrap();

    let a = classify_raster(&src, &forward);
    let b = classify_raster(&src, &reversed);
    let idx = src.data.iter().position(|&v| v == 15.0).unwrap();
    assert_eq!(a.data[idx], 2.0);
    assert_eq!(b.data[idx], 1.0);
}

#[test]
fn test_classify_geotiff_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = RasterStore::new();
    let input = RasterLocation::file(dir.path().join("slope_utm45n.tif"));
    let output = RasterLocation::file(dir.path().join("temp/cls_slope.tif"));
    store.write(&input, slope_ramp()).unwrap();

    classify(&store, &input, &output, standard_table(Parameter::Slope)).unwrap();

    let written = store.open(&output).unwrap();
    assert_eq!(written.data_type, DataType::Int8);
    assert_eq!(written.nodata, Some(-128.0));
    assert_eq!(written.crs, Some(Crs::UTM_45N));
    let allowed = [-128.0, 1.0, 2.0, 4.0, 6.0];
    assert!(written.data.iter().all(|v| allowed.contains(v)));
}

#[test]
fn test_unreadable_input_is_resource_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = RasterStore::new();
    let input = RasterLocation::file(dir.path().join("missing.tif"));
    let output = RasterLocation::file(dir.path().join("out.tif"));

    let err = classify(&store, &input, &output, standard_table(Parameter::Dem)).unwrap_err();
    assert!(matches!(
        err,
        classification::ClassificationError::Raster(ref e) if e.is_resource_error()
    ));
    assert!(!store.exists(&output));
}
