//! Forecast ingestion library.
//!
//! Reads the raw regional forecast table, decodes the EWKB point geometry of
//! each record and splits the records into one artifact per forecast day.
//!
//! # Architecture
//!
//! ```text
//! raw forecast CSV
//!      │
//!      ├─► rename columns, round ppt/tmax/rh, clip ppt to 127
//!      ├─► parse dates, decode geom → (lat, lon)
//!      ├─► sort by (administrative_id, start)
//!      │
//!      └─► DaySplitter (lazy): one `{i}_day_forecast.csv` per start date
//! ```

pub mod error;
pub mod ewkb;
pub mod record;
pub mod splitter;

// Re-exports
pub use error::{DecodeError, IngestionError, Result};
pub use ewkb::decode_point;
pub use record::{
    parse_datetime, read_forecast, read_forecast_csv, DayRow, ForecastRecord,
    PPT_MAX,
};
pub use splitter::{
    day_artifact_name, split_by_day, split_forecast_file, DaySplitter, ForecastDayDataset,
    SplitOutcome,
};
