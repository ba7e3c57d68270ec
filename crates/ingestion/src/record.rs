//! Forecast records and the raw table they are read from.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{IngestionError, Result};
use crate::ewkb::decode_point;

/// Precipitation ceiling, the largest value the classified byte range holds.
pub const PPT_MAX: i64 = 127;

/// One row of the raw forecast table, with source column names.
#[derive(Debug, Clone, Deserialize)]
struct RawForecastRow {
    administrative_id: i64,
    #[serde(rename = "date_range_start")]
    s_date: String,
    #[serde(rename = "date_range_end")]
    e_date: String,
    #[serde(rename = "rainfall_daily_weighted_average")]
    ppt: f64,
    #[serde(rename = "tmax_daily_tmax_region")]
    tmax: f64,
    #[serde(rename = "rh_daily_avg_region")]
    rh: f64,
    #[serde(rename = "ws_daily_avg_region", default)]
    ws: Option<f64>,
    geom: String,
}

/// One forecast observation with values rounded and geometry decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRecord {
    pub administrative_id: i64,
    /// Wall-clock start time as written, any offset dropped.
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Start and end exactly as they appear in the export.
    pub s_date: String,
    pub e_date: String,
    /// Precipitation, rounded and clipped to [`PPT_MAX`].
    pub ppt: i64,
    pub tmax: i64,
    pub rh: i64,
    pub ws: Option<f64>,
    pub geom: String,
    pub lat: f64,
    pub lon: f64,
}

impl ForecastRecord {
    fn from_raw(raw: RawForecastRow, row: u64) -> Result<Self> {
        let (lat, lon) = decode_point(raw.geom.trim())
            .map_err(|source| IngestionError::Geometry { row, source })?;

        Ok(Self {
            administrative_id: raw.administrative_id,
            start: parse_datetime(&raw.s_date)
                .ok_or_else(|| IngestionError::invalid_row(row, format!("bad start date '{}'", raw.s_date)))?,
            end: parse_datetime(&raw.e_date)
                .ok_or_else(|| IngestionError::invalid_row(row, format!("bad end date '{}'", raw.e_date)))?,
            ppt: round_value(raw.ppt, "ppt", row)?.min(PPT_MAX),
            tmax: round_value(raw.tmax, "tmax", row)?,
            rh: round_value(raw.rh, "rh", row)?,
            ws: raw.ws,
            s_date: raw.s_date,
            e_date: raw.e_date,
            geom: raw.geom,
            lat,
            lon,
        })
    }

    /// Calendar day of the start date.
    pub fn start_date(&self) -> NaiveDate {
        self.start.date()
    }
}

/// Row of a per-day artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRow {
    pub lat: f64,
    pub lon: f64,
    pub ppt: i64,
    pub tmax: i64,
    pub rh: i64,
    pub s_date: String,
    pub e_date: String,
}

impl From<&ForecastRecord> for DayRow {
    fn from(record: &ForecastRecord) -> Self {
        Self {
            lat: record.lat,
            lon: record.lon,
            ppt: record.ppt,
            tmax: record.tmax,
            rh: record.rh,
            s_date: record.s_date.clone(),
            e_date: record.e_date.clone(),
        }
    }
}

/// Read and normalize a raw forecast table from disk.
pub fn read_forecast_csv(path: &Path) -> Result<Vec<ForecastRecord>> {
    let records = read_forecast(File::open(path)?)?;
    debug!(path = %path.display(), records = records.len(), "Read forecast table");
    Ok(records)
}

/// Read and normalize a raw forecast table.
///
/// Fails on the first malformed row; extra columns are ignored.
pub fn read_forecast<R: Read>(reader: R) -> Result<Vec<ForecastRecord>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut records = Vec::new();
    for (i, row) in rdr.deserialize::<RawForecastRow>().enumerate() {
        // Header is line 1
        let line = i as u64 + 2;
        records.push(ForecastRecord::from_raw(row?, line)?);
    }
    Ok(records)
}

/// Parse the date formats found in forecast exports.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS`
/// (optionally with fractional seconds), each optionally followed by a UTC
/// offset. Offsets are dropped: the result is the local wall-clock time, so
/// a record keeps the calendar day it was exported under.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Some(dt.naive_local());
        }
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Round half to even, as the upstream tabular exports do.
fn round_value(value: f64, column: &str, row: u64) -> Result<i64> {
    if !value.is_finite() {
        return Err(IngestionError::invalid_row(row, format!("{} is not a finite number", column)));
    }
    Ok(value.round_ties_even() as i64)
}
