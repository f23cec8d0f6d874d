//! Fake file listings and sample-axis construction.
//!
//! Test instruments pretend to read one file per day. The file names carry
//! the date, and the time index is rebuilt from those names just as a real
//! loader would do it.

use crate::constants::{
    FAKE_FILE_EXTENSION, FILE_LIST_YEARS_AFTER, FILE_LIST_YEARS_BEFORE, LAST_SECOND_OF_DAY,
    MALFORMED_INDEX_MIN_SAMPLES, MANGLED_FILE_OFFSET_MINUTES, SECONDS_PER_DAY, root_date,
    test_date,
};
use crate::error::{InstrumentError, Result};
use chrono::{Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// A fake data file and the day it covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub date: NaiveDate,
    /// Time the file list reports for this file; midnight unless mangled
    pub timestamp: NaiveDateTime,
    pub name: String,
}

/// Build the fake file name for a day
pub fn file_name(date: NaiveDate, data_path: Option<&Path>) -> String {
    let base = format!("{}.{}", date.format("%Y-%m-%d"), FAKE_FILE_EXTENSION);
    match data_path {
        Some(path) => path.join(base).to_string_lossy().into_owned(),
        None => base,
    }
}

/// Recover the day encoded in a fake file name
pub fn date_from_file_name(name: &str) -> Result<NaiveDate> {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(name);

    let stamp = base.get(0..10).ok_or_else(|| {
        InstrumentError::invalid_request(format!("file name '{}' does not start with a date", name))
    })?;

    NaiveDate::parse_from_str(stamp, "%Y-%m-%d").map_err(|e| {
        InstrumentError::invalid_request(format!("file name '{}' has a bad date: {}", name, e))
    })
}

/// Default listing window: one year before to two years after the test date
pub fn default_file_range() -> (NaiveDate, NaiveDate) {
    let date = test_date();
    let start = date
        .checked_sub_months(Months::new(12 * FILE_LIST_YEARS_BEFORE as u32))
        .unwrap_or(date);
    let stop = date
        .checked_add_months(Months::new(12 * FILE_LIST_YEARS_AFTER as u32))
        .map(|d| d - TimeDelta::days(1))
        .unwrap_or(date);
    (start, stop)
}

/// List one fake file per day over an inclusive date range.
///
/// With `mangle_file_dates` every file timestamp is pushed five minutes past
/// midnight, while the names still carry the plain date.
pub fn list_files(
    range: Option<(NaiveDate, NaiveDate)>,
    data_path: Option<&Path>,
    mangle_file_dates: bool,
) -> Vec<FileEntry> {
    let (start, stop) = range.unwrap_or_else(default_file_range);
    let shift = if mangle_file_dates {
        TimeDelta::minutes(MANGLED_FILE_OFFSET_MINUTES)
    } else {
        TimeDelta::zero()
    };

    let files: Vec<FileEntry> = start
        .iter_days()
        .take_while(|day| *day <= stop)
        .map(|date| FileEntry {
            date,
            timestamp: date.and_time(NaiveTime::MIN) + shift,
            name: file_name(date, data_path),
        })
        .collect();

    debug!(
        "Listed {} fake files from {} to {} (mangled: {})",
        files.len(),
        start,
        stop,
        mangle_file_dates
    );
    files
}

/// Time index and universal time seconds for a load
#[derive(Debug, Clone, PartialEq)]
pub struct SampleAxis {
    /// Sample timestamps
    pub index: Vec<NaiveDateTime>,
    /// Seconds of day, offset by a day for each additional file
    pub uts: Vec<f64>,
    /// Day of each loaded file
    pub dates: Vec<NaiveDate>,
}

impl SampleAxis {
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Milliseconds since the Unix epoch for every sample
    pub fn epoch_millis(&self) -> Vec<i64> {
        self.index
            .iter()
            .map(|t| t.and_utc().timestamp_millis())
            .collect()
    }

    /// Seconds between the orbit root date and the first loaded day
    pub fn orbit_offset_seconds(&self) -> f64 {
        self.dates
            .first()
            .map(|first| (*first - root_date()).num_seconds() as f64)
            .unwrap_or(0.0)
    }

    /// Scramble the index: non-monotonic first six samples, non-unique 6..9
    pub fn malform(&mut self) -> Result<()> {
        if self.index.len() < MALFORMED_INDEX_MIN_SAMPLES {
            return Err(InstrumentError::invalid_request(format!(
                "a malformed index needs at least {} samples, got {}",
                MALFORMED_INDEX_MIN_SAMPLES,
                self.index.len()
            )));
        }

        for i in 0..3 {
            self.index.swap(i, i + 3);
        }
        let repeated = self.index[6];
        self.index[6..9].fill(repeated);
        Ok(())
    }
}

/// Construct the time index for a list of fake file names.
///
/// Each file contributes up to `num` samples spaced `freq_seconds` apart,
/// starting at `start_offset` after midnight and never passing the end of
/// the file's day.
pub fn generate_times(
    file_names: &[String],
    num: usize,
    freq_seconds: i64,
    start_offset: TimeDelta,
) -> Result<SampleAxis> {
    if freq_seconds <= 0 {
        return Err(InstrumentError::Configuration {
            message: format!("sample frequency must be positive, got {}s", freq_seconds),
        });
    }

    let offset_seconds = start_offset.num_seconds();
    let per_day = if offset_seconds > LAST_SECOND_OF_DAY {
        0
    } else {
        (((LAST_SECOND_OF_DAY - offset_seconds) / freq_seconds) as usize + 1).min(num)
    };

    let mut index = Vec::with_capacity(per_day * file_names.len());
    let mut uts = Vec::with_capacity(per_day * file_names.len());
    let mut dates = Vec::with_capacity(file_names.len());

    for (day_num, name) in file_names.iter().enumerate() {
        let date = date_from_file_name(name)?;
        dates.push(date);

        let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
        let first = midnight + start_offset;

        for step in 0..per_day {
            let time = first + TimeDelta::seconds(step as i64 * freq_seconds);
            index.push(time);
            uts.push(
                time.num_seconds_from_midnight() as f64
                    + (SECONDS_PER_DAY as f64) * day_num as f64,
            );
        }
    }

    Ok(SampleAxis { index, uts, dates })
}
