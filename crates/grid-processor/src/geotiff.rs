//! Single-band GeoTIFF reading and writing.
//!
//! Georeferencing is carried by the standard GeoTIFF tags:
//! - ModelPixelScale (33550) + ModelTiepoint (33922) for north-up rasters
//! - ModelTransformation (34264) for rotated rasters
//! - GeoKeyDirectory (34735) holding the EPSG code
//! - GDAL_NODATA (42113) holding the nodata value as ASCII

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use hazard_common::Crs;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::encoder::{colortype, TiffEncoder, TiffValue};
use tiff::tags::Tag;
use tiff::ColorType;
use tracing::{debug, warn};

use crate::error::{GridProcessorError, Result};
use crate::types::{DataType, GeoTransform, Raster};

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

const GT_MODEL_TYPE_KEY: u16 = 1024;
const GT_RASTER_TYPE_KEY: u16 = 1025;
const GEOGRAPHIC_TYPE_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_KEY: u16 = 3072;

const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;

/// Read a single-band GeoTIFF from disk.
pub fn read_geotiff(path: &Path) -> Result<Raster> {
    let file = File::open(path)
        .map_err(|e| GridProcessorError::open_failed(format!("{}: {}", path.display(), e)))?;

    let raster = decode(BufReader::new(file), &path.display().to_string())?;
    debug!(
        path = %path.display(),
        width = raster.width,
        height = raster.height,
        data_type = %raster.data_type,
        "Read GeoTIFF"
    );
    Ok(raster)
}

/// Decode a single-band GeoTIFF from any seekable reader.
///
/// `source` only labels error messages.
pub fn decode<R: Read + Seek>(reader: R, source: &str) -> Result<Raster> {
    let mut decoder = Decoder::new(reader)
        .map_err(|e| GridProcessorError::open_failed(format!("{}: {}", source, e)))?
        .with_limits(Limits::unlimited());

    match decoder.colortype() {
        Ok(ColorType::Gray(_)) => {}
        Ok(other) => {
            return Err(GridProcessorError::MissingBand(format!(
                "{} has color type {:?}, expected a single gray band",
                source, other
            )))
        }
        Err(e) => return Err(GridProcessorError::MissingBand(format!("{}: {}", source, e))),
    }

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| GridProcessorError::read_failed(format!("{}: {}", source, e)))?;

    let geotransform = read_geotransform(&mut decoder, source)?;
    let crs = read_crs(&mut decoder, source);
    let nodata = read_nodata(&mut decoder);

    let image = decoder
        .read_image()
        .map_err(|e| GridProcessorError::read_failed(format!("{}: {}", source, e)))?;
    let (data_type, data) = widen(image, source)?;

    let raster = Raster::new(
        width as usize,
        height as usize,
        geotransform,
        crs,
        data_type,
        data,
    )?;
    Ok(raster.with_nodata(nodata))
}

/// Write a raster as a single-band GeoTIFF, replacing any existing file.
pub fn write_geotiff(path: &Path, raster: &Raster) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)
        .map_err(|e| GridProcessorError::write_failed(format!("{}: {}", path.display(), e)))?;
    let mut writer = BufWriter::new(file);
    encode(&mut writer, raster)
        .map_err(|e| GridProcessorError::write_failed(format!("{}: {}", path.display(), e)))?;
    writer
        .flush()
        .map_err(|e| GridProcessorError::write_failed(format!("{}: {}", path.display(), e)))?;

    debug!(
        path = %path.display(),
        width = raster.width,
        height = raster.height,
        data_type = %raster.data_type,
        "Wrote GeoTIFF"
    );
    Ok(())
}

/// Encode a raster into any seekable writer.
pub fn encode<W: Write + Seek>(writer: W, raster: &Raster) -> Result<()> {
    let mut encoder =
        TiffEncoder::new(writer).map_err(|e| GridProcessorError::write_failed(e.to_string()))?;
    let tags = GeoTags::for_raster(raster);
    let dt = raster.data_type;

    macro_rules! narrow {
        ($t:ty) => {
            raster
                .data
                .iter()
                .map(|&v| dt.cast(v) as $t)
                .collect::<Vec<$t>>()
        };
    }

    match dt {
        DataType::UInt8 => write_band::<_, colortype::Gray8>(&mut encoder, raster, &narrow!(u8), &tags),
        DataType::Int8 => write_band::<_, colortype::GrayI8>(&mut encoder, raster, &narrow!(i8), &tags),
        DataType::UInt16 => write_band::<_, colortype::Gray16>(&mut encoder, raster, &narrow!(u16), &tags),
        DataType::Int16 => write_band::<_, colortype::GrayI16>(&mut encoder, raster, &narrow!(i16), &tags),
        DataType::UInt32 => write_band::<_, colortype::Gray32>(&mut encoder, raster, &narrow!(u32), &tags),
        DataType::Int32 => write_band::<_, colortype::GrayI32>(&mut encoder, raster, &narrow!(i32), &tags),
        DataType::Float32 => {
            write_band::<_, colortype::Gray32Float>(&mut encoder, raster, &narrow!(f32), &tags)
        }
        DataType::Float64 => {
            write_band::<_, colortype::Gray64Float>(&mut encoder, raster, &raster.data, &tags)
        }
    }
}

/// Georeferencing tag payloads for one image.
struct GeoTags {
    pixel_scale: Option<[f64; 3]>,
    tiepoint: Option<[f64; 6]>,
    transformation: Option<[f64; 16]>,
    geo_keys: Vec<u16>,
    nodata: Option<String>,
}

impl GeoTags {
    fn for_raster(raster: &Raster) -> Self {
        let g = raster.geotransform.0;
        let (pixel_scale, tiepoint, transformation) = if raster.geotransform.is_north_up() {
            (
                Some([g[1], -g[5], 0.0]),
                Some([0.0, 0.0, 0.0, g[0], g[3], 0.0]),
                None,
            )
        } else {
            let m = [
                g[1], g[2], 0.0, g[0], //
                g[4], g[5], 0.0, g[3], //
                0.0, 0.0, 0.0, 0.0, //
                0.0, 0.0, 0.0, 1.0,
            ];
            (None, None, Some(m))
        };

        Self {
            pixel_scale,
            tiepoint,
            transformation,
            geo_keys: geo_key_directory(raster.crs),
            nodata: raster.nodata.map(format_nodata),
        }
    }
}

fn write_band<W, C>(
    encoder: &mut TiffEncoder<W>,
    raster: &Raster,
    data: &[C::Inner],
    tags: &GeoTags,
) -> Result<()>
where
    W: Write + Seek,
    C: colortype::ColorType,
    [C::Inner]: TiffValue,
{
    let write_err = |e: tiff::TiffError| GridProcessorError::write_failed(e.to_string());

    let mut image = encoder
        .new_image::<C>(raster.width as u32, raster.height as u32)
        .map_err(write_err)?;

    {
        let dir = image.encoder();
        if let Some(scale) = &tags.pixel_scale {
            dir.write_tag(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE), &scale[..])
                .map_err(write_err)?;
        }
        if let Some(tie) = &tags.tiepoint {
            dir.write_tag(Tag::from_u16_exhaustive(MODEL_TIEPOINT), &tie[..])
                .map_err(write_err)?;
        }
        if let Some(m) = &tags.transformation {
            dir.write_tag(Tag::from_u16_exhaustive(MODEL_TRANSFORMATION), &m[..])
                .map_err(write_err)?;
        }
        if !tags.geo_keys.is_empty() {
            dir.write_tag(Tag::from_u16_exhaustive(GEO_KEY_DIRECTORY), &tags.geo_keys[..])
                .map_err(write_err)?;
        }
        if let Some(nodata) = &tags.nodata {
            dir.write_tag(Tag::from_u16_exhaustive(GDAL_NODATA), nodata.as_str())
                .map_err(write_err)?;
        }
    }

    image.write_data(data).map_err(write_err)
}

/// GeoKeyDirectory entries for a CRS (header + one entry per key).
fn geo_key_directory(crs: Option<Crs>) -> Vec<u16> {
    let Some(crs) = crs else {
        return Vec::new();
    };

    let Ok(code) = u16::try_from(crs.epsg()) else {
        warn!(crs = %crs, "EPSG code does not fit a GeoKey, writing without CRS");
        return Vec::new();
    };

    let (model_type, crs_key) = if crs.is_geographic() {
        (MODEL_TYPE_GEOGRAPHIC, GEOGRAPHIC_TYPE_KEY)
    } else {
        (MODEL_TYPE_PROJECTED, PROJECTED_CS_TYPE_KEY)
    };

    let entries = [
        [GT_MODEL_TYPE_KEY, 0, 1, model_type],
        [GT_RASTER_TYPE_KEY, 0, 1, RASTER_PIXEL_IS_AREA],
        [crs_key, 0, 1, code],
    ];

    let mut keys = vec![1, 1, 0, entries.len() as u16];
    for entry in entries {
        keys.extend_from_slice(&entry);
    }
    keys
}

fn format_nodata(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>, source: &str) -> Result<GeoTransform> {
    let transformation = find_f64_tag(decoder, MODEL_TRANSFORMATION);
    if let Some(m) = transformation.filter(|m| m.len() >= 8) {
        return Ok(GeoTransform([m[3], m[0], m[1], m[7], m[4], m[5]]));
    }

    let scale = find_f64_tag(decoder, MODEL_PIXEL_SCALE);
    let tiepoint = find_f64_tag(decoder, MODEL_TIEPOINT);

    match (scale, tiepoint) {
        (Some(scale), Some(tie)) if scale.len() >= 2 && tie.len() >= 6 => {
            let (sx, sy) = (scale[0], scale[1]);
            Ok(GeoTransform([
                tie[3] - tie[0] * sx,
                sx,
                0.0,
                tie[4] + tie[1] * sy,
                0.0,
                -sy,
            ]))
        }
        _ => Err(GridProcessorError::invalid_raster(format!(
            "{} has no georeferencing tags",
            source
        ))),
    }
}

fn read_crs<R: Read + Seek>(decoder: &mut Decoder<R>, source: &str) -> Option<Crs> {
    let keys = decoder
        .find_tag(Tag::from_u16_exhaustive(GEO_KEY_DIRECTORY))
        .ok()
        .flatten()?
        .into_u32_vec()
        .ok()?;

    if keys.len() < 4 {
        return None;
    }

    let count = keys[3] as usize;
    let code = keys[4..]
        .chunks_exact(4)
        .take(count)
        .filter(|entry| entry[1] == 0)
        .find(|entry| {
            entry[0] == PROJECTED_CS_TYPE_KEY as u32 || entry[0] == GEOGRAPHIC_TYPE_KEY as u32
        })
        .map(|entry| entry[3])?;

    match Crs::from_epsg(code) {
        Ok(crs) => Some(crs),
        Err(e) => {
            warn!(source = source, error = %e, "Ignoring unsupported CRS");
            None
        }
    }
}

fn read_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<f64> {
    let text = decoder
        .find_tag(Tag::from_u16_exhaustive(GDAL_NODATA))
        .ok()
        .flatten()?
        .into_string()
        .ok()?;
    text.trim_matches(char::from(0)).trim().parse().ok()
}

fn find_f64_tag<R: Read + Seek>(decoder: &mut Decoder<R>, code: u16) -> Option<Vec<f64>> {
    decoder
        .find_tag(Tag::from_u16_exhaustive(code))
        .ok()
        .flatten()?
        .into_f64_vec()
        .ok()
}

/// Widen decoded samples to `f64`, remembering the storage type.
fn widen(image: DecodingResult, source: &str) -> Result<(DataType, Vec<f64>)> {
    fn to_f64<T: Copy + Into<f64>>(v: Vec<T>) -> Vec<f64> {
        v.into_iter().map(Into::into).collect()
    }

    let widened = match image {
        DecodingResult::U8(v) => (DataType::UInt8, to_f64(v)),
        DecodingResult::I8(v) => (DataType::Int8, to_f64(v)),
        DecodingResult::U16(v) => (DataType::UInt16, to_f64(v)),
        DecodingResult::I16(v) => (DataType::Int16, to_f64(v)),
        DecodingResult::U32(v) => (DataType::UInt32, to_f64(v)),
        DecodingResult::I32(v) => (DataType::Int32, to_f64(v)),
        DecodingResult::F32(v) => (DataType::Float32, to_f64(v)),
        DecodingResult::F64(v) => (DataType::Float64, v),
        #[allow(unreachable_patterns)]
        _ => {
            return Err(GridProcessorError::read_failed(format!(
                "{} uses an unsupported 64-bit integer sample type",
                source
            )))
        }
    };
    Ok(widened)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample(data_type: DataType, crs: Crs, nodata: Option<f64>) -> Raster {
        let gt = GeoTransform::north_up(300_000.0, 3_100_000.0, 30.0, 30.0);
        let data = vec![1.0, 2.0, -128.0, 4.0, 5.0, 6.0];
        Raster::new(3, 2, gt, Some(crs), data_type, data)
            .unwrap()
            .with_nodata(nodata)
    }

    fn roundtrip(raster: &Raster) -> Raster {
        let mut buf = Cursor::new(Vec::new());
        encode(&mut buf, raster).unwrap();
        buf.set_position(0);
        decode(buf, "memory").unwrap()
    }

    #[test]
    fn test_int8_roundtrip() {
        let raster = sample(DataType::Int8, Crs::UTM_45N, Some(-128.0));
        let decoded = roundtrip(&raster);
        assert_eq!(decoded, raster);
    }

    #[test]
    fn test_float32_geographic_roundtrip() {
        let gt = GeoTransform::north_up(84.0, 29.0, 0.25, 0.25);
        let raster = Raster::new(2, 2, gt, Some(Crs::Wgs84), DataType::Float32, vec![0.5, 1.5, -9999.0, 3.25])
            .unwrap()
            .with_nodata(Some(-9999.0));
        let decoded = roundtrip(&raster);

        assert_eq!(decoded.crs, Some(Crs::Wgs84));
        assert_eq!(decoded.nodata, Some(-9999.0));
        assert_eq!(decoded.data_type, DataType::Float32);
        assert_eq!(decoded.geotransform, gt);
        assert_eq!(decoded.data, raster.data);
    }

    #[test]
    fn test_rotated_transform_roundtrip() {
        let gt = GeoTransform([100.0, 2.0, 0.5, 200.0, 0.25, -2.0]);
        let raster = Raster::new(2, 1, gt, None, DataType::Float64, vec![1.0, 2.0]).unwrap();
        let decoded = roundtrip(&raster);
        assert_eq!(decoded.geotransform, gt);
        assert_eq!(decoded.crs, None);
        assert_eq!(decoded.nodata, None);
    }

    #[test]
    fn test_geo_key_directory() {
        let keys = geo_key_directory(Some(Crs::UTM_45N));
        assert_eq!(&keys[..4], &[1, 1, 0, 3]);
        assert_eq!(&keys[12..], &[3072, 0, 1, 32645]);

        let keys = geo_key_directory(Some(Crs::Wgs84));
        assert_eq!(&keys[4..8], &[1024, 0, 1, 2]);
        assert_eq!(&keys[12..], &[2048, 0, 1, 4326]);

        assert!(geo_key_directory(None).is_empty());
    }

    #[test]
    fn test_format_nodata() {
        assert_eq!(format_nodata(-9999.0), "-9999");
        assert_eq!(format_nodata(-128.0), "-128");
        assert_eq!(format_nodata(0.5), "0.5");
        assert_eq!(format_nodata(f64::NAN), "nan");
    }

    #[test]
    fn test_garbage_is_open_failure() {
        let err = decode(Cursor::new(b"not a tiff".to_vec()), "junk").unwrap_err();
        assert!(err.is_resource_error());
    }

    #[test]
    fn test_missing_file_is_open_failure() {
        let err = read_geotiff(Path::new("/nonexistent/raster.tif")).unwrap_err();
        assert!(matches!(err, GridProcessorError::OpenFailed(_)));
    }
}
