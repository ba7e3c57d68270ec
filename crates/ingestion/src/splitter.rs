//! Per-day forecast splitting.
//!
//! Records are grouped by the calendar day of their start date and every
//! group is written as `{index}_day_forecast.csv`, with 1-based indices in
//! chronological order. Writing stops at the first day whose artifact cannot
//! be written; earlier days stay valid.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::error::Result;
use crate::record::{read_forecast_csv, DayRow, ForecastRecord};

/// Artifact file name for a 1-based day index.
pub fn day_artifact_name(index: usize) -> String {
    format!("{}_day_forecast.csv", index)
}

/// One day of forecast records and the artifact holding them.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastDayDataset {
    /// 1-based position in chronological order.
    pub index: usize,
    pub date: NaiveDate,
    pub records: Vec<ForecastRecord>,
    pub path: PathBuf,
}

/// Lazy per-day splitter. Each `next()` writes one day's artifact.
///
/// Once a write fails the iterator is exhausted for good.
#[derive(Debug)]
pub struct DaySplitter {
    groups: std::vec::IntoIter<(NaiveDate, Vec<ForecastRecord>)>,
    output_dir: PathBuf,
    next_index: usize,
    total_days: usize,
    stop_reason: Option<String>,
}

impl DaySplitter {
    pub fn new(mut records: Vec<ForecastRecord>, output_dir: impl Into<PathBuf>) -> Self {
        records.sort_by(|a, b| {
            a.administrative_id
                .cmp(&b.administrative_id)
                .then(a.start.cmp(&b.start))
        });

        let mut by_day: BTreeMap<NaiveDate, Vec<ForecastRecord>> = BTreeMap::new();
        for record in records {
            by_day.entry(record.start_date()).or_default().push(record);
        }

        let groups: Vec<_> = by_day.into_iter().collect();
        Self {
            total_days: groups.len(),
            groups: groups.into_iter(),
            output_dir: output_dir.into(),
            next_index: 1,
            stop_reason: None,
        }
    }

    /// Number of distinct start dates.
    pub fn total_days(&self) -> usize {
        self.total_days
    }

    /// Why splitting stopped early, if it did.
    pub fn stop_reason(&self) -> Option<&str> {
        self.stop_reason.as_deref()
    }

    fn write_day(&self, path: &Path, records: &[ForecastRecord]) -> std::result::Result<(), String> {
        let mut writer = csv::Writer::from_path(path).map_err(|e| e.to_string())?;
        for record in records {
            writer.serialize(DayRow::from(record)).map_err(|e| e.to_string())?;
        }
        writer.flush().map_err(|e| e.to_string())?;

        if path.is_file() {
            Ok(())
        } else {
            Err("artifact missing after write".to_string())
        }
    }
}

impl Iterator for DaySplitter {
    type Item = ForecastDayDataset;

    fn next(&mut self) -> Option<Self::Item> {
        if self.stop_reason.is_some() {
            return None;
        }

        let (date, records) = self.groups.next()?;
        let index = self.next_index;
        let path = self.output_dir.join(day_artifact_name(index));

        match self.write_day(&path, &records) {
            Ok(()) => {
                info!(day = index, date = %date, records = records.len(), path = %path.display(), "Wrote forecast day");
                self.next_index += 1;
                Some(ForecastDayDataset {
                    index,
                    date,
                    records,
                    path,
                })
            }
            Err(reason) => {
                warn!(day = index, date = %date, path = %path.display(), error = %reason, "Could not write forecast day, stopping");
                self.stop_reason = Some(format!("day {} ({}): {}", index, date, reason));
                None
            }
        }
    }
}

/// Result of splitting a forecast into days.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitOutcome {
    pub days: Vec<ForecastDayDataset>,
    pub total_days: usize,
    pub stop_reason: Option<String>,
}

impl SplitOutcome {
    pub fn completed(&self) -> usize {
        self.days.len()
    }

    pub fn is_complete(&self) -> bool {
        self.days.len() == self.total_days
    }
}

/// Split records into day artifacts, collecting every day written.
pub fn split_by_day(records: Vec<ForecastRecord>, output_dir: impl Into<PathBuf>) -> SplitOutcome {
    let mut splitter = DaySplitter::new(records, output_dir);
    let days: Vec<_> = splitter.by_ref().collect();
    let outcome = SplitOutcome {
        days,
        total_days: splitter.total_days(),
        stop_reason: splitter.stop_reason().map(str::to_string),
    };

    if !outcome.is_complete() {
        warn!(
            completed = outcome.completed(),
            total = outcome.total_days,
            "Forecast split truncated"
        );
    }
    outcome
}

/// Read a raw forecast table and split it into day artifacts.
pub fn split_forecast_file(csv_path: &Path, output_dir: &Path) -> Result<SplitOutcome> {
    let records = read_forecast_csv(csv_path)?;
    Ok(split_by_day(records, output_dir))
}
