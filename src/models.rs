//! Core data structures and types for synthetic instrument generation.
//!
//! Defines the instrument kinds, container formats, load requests, model
//! grids and processing statistics used throughout the library.

use crate::constants::{
    self, HIGH_RATE_FREQ_SECONDS, HIGH_RATE_NUM_SAMPLES, MODEL_FREQ_SECONDS, MODEL_NUM_SAMPLES,
    PROFILE_RATE_FREQ_SECONDS, PROFILE_RATE_NUM_SAMPLES, SECONDS_PER_DAY,
};
use crate::error::{InstrumentError, Result};
use chrono::{NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Tags accepted by the scalar instruments
const SCALAR_TAGS: &[(&str, &str)] = &[
    ("", "Regular testing data set"),
    ("ascend", "Ascending integers from 0 testing data set"),
    ("descend", "Descending integers from 0 testing data set"),
    ("plus10", "Ascending integers from 10 testing data set"),
    ("fives", "All 5s testing data set"),
    ("mlt_offset", "Magnetic local time offset by 5 hours testing data set"),
];

/// Tags accepted by the profile, image and model instruments
const REGULAR_TAGS: &[(&str, &str)] = &[("", "Regular testing data set")];

/// Instrument IDs shared by every test instrument
pub const INST_IDS: &[&str] = &[""];

/// Synthetic instruments available for loading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstrumentKind {
    /// Tabular scalar orbit data
    Testing,
    /// Labeled-array scalar orbit data
    TestingXarray,
    /// Tabular orbit data with altitude profiles
    Testing2d,
    /// Tabular orbit data with images
    NdTesting,
    /// Labeled-array orbit data with profiles and images
    Testing2dXarray,
    /// 4D model output
    TestModel,
}

/// Container layout a dataset is delivered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerFormat {
    /// Row per sample, nested payloads as list columns
    Tabular,
    /// Named dimensions with coordinates and data variables
    LabeledArray,
}

impl InstrumentKind {
    /// Every instrument in registration order
    pub const ALL: [InstrumentKind; 6] = [
        InstrumentKind::Testing,
        InstrumentKind::TestingXarray,
        InstrumentKind::Testing2d,
        InstrumentKind::NdTesting,
        InstrumentKind::Testing2dXarray,
        InstrumentKind::TestModel,
    ];

    /// Instrument name without the platform prefix
    pub fn name(&self) -> &'static str {
        match self {
            InstrumentKind::Testing => "testing",
            InstrumentKind::TestingXarray => "testing_xarray",
            InstrumentKind::Testing2d => "testing2d",
            InstrumentKind::NdTesting => "ndtesting",
            InstrumentKind::Testing2dXarray => "testing2d_xarray",
            InstrumentKind::TestModel => "testmodel",
        }
    }

    /// Module-style name, e.g. `pysat_testing`
    pub fn full_name(&self) -> String {
        format!("{}_{}", constants::PLATFORM, self.name())
    }

    /// Container format produced by this instrument
    pub fn container(&self) -> ContainerFormat {
        match self {
            InstrumentKind::Testing | InstrumentKind::Testing2d | InstrumentKind::NdTesting => {
                ContainerFormat::Tabular
            }
            InstrumentKind::TestingXarray
            | InstrumentKind::Testing2dXarray
            | InstrumentKind::TestModel => ContainerFormat::LabeledArray,
        }
    }

    /// Seconds between consecutive samples
    pub fn frequency_seconds(&self) -> i64 {
        match self {
            InstrumentKind::Testing | InstrumentKind::TestingXarray => HIGH_RATE_FREQ_SECONDS,
            InstrumentKind::Testing2d
            | InstrumentKind::NdTesting
            | InstrumentKind::Testing2dXarray => PROFILE_RATE_FREQ_SECONDS,
            InstrumentKind::TestModel => MODEL_FREQ_SECONDS,
        }
    }

    /// Samples per day when the request does not specify a count
    pub fn default_num_samples(&self) -> usize {
        match self {
            InstrumentKind::Testing | InstrumentKind::TestingXarray => HIGH_RATE_NUM_SAMPLES,
            InstrumentKind::Testing2d
            | InstrumentKind::NdTesting
            | InstrumentKind::Testing2dXarray => PROFILE_RATE_NUM_SAMPLES,
            InstrumentKind::TestModel => MODEL_NUM_SAMPLES,
        }
    }

    /// Supported tags with their descriptions
    pub fn tags(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            InstrumentKind::Testing | InstrumentKind::TestingXarray => SCALAR_TAGS,
            _ => REGULAR_TAGS,
        }
    }

    /// Check a tag against the supported list
    pub fn validate_tag(&self, tag: &str) -> Result<()> {
        if self.tags().iter().any(|(name, _)| *name == tag) {
            Ok(())
        } else {
            Err(InstrumentError::UnknownTag {
                instrument: self.full_name(),
                tag: tag.to_string(),
            })
        }
    }
}

impl fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name())
    }
}

impl FromStr for InstrumentKind {
    type Err = InstrumentError;

    /// Accepts both `testing` and `pysat_testing`
    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_lowercase();
        let prefix = format!("{}_", constants::PLATFORM);
        let bare = lowered.strip_prefix(&prefix).unwrap_or(&lowered);

        InstrumentKind::ALL
            .into_iter()
            .find(|kind| kind.name() == bare)
            .ok_or_else(|| InstrumentError::UnknownInstrument {
                name: s.to_string(),
            })
    }
}

/// One axis of the model grid, stop inclusive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub start: f64,
    pub stop: f64,
    pub points: usize,
}

impl AxisRange {
    pub fn new(start: f64, stop: f64, points: usize) -> Self {
        Self {
            start,
            stop,
            points,
        }
    }

    /// Evenly spaced axis values
    pub fn values(&self) -> Vec<f64> {
        if self.points == 1 {
            return vec![self.start];
        }
        let step = (self.stop - self.start) / (self.points - 1) as f64;
        (0..self.points)
            .map(|i| self.start + step * i as f64)
            .collect()
    }

    fn validate(&self, axis: &str) -> Result<()> {
        if self.points == 0 {
            return Err(InstrumentError::invalid_request(format!(
                "{} axis must contain at least one point",
                axis
            )));
        }
        if !self.start.is_finite() || !self.stop.is_finite() || self.stop < self.start {
            return Err(InstrumentError::invalid_request(format!(
                "{} axis range [{}, {}] is invalid",
                axis, self.start, self.stop
            )));
        }
        Ok(())
    }
}

impl From<(f64, f64, usize)> for AxisRange {
    fn from((start, stop, points): (f64, f64, usize)) -> Self {
        Self::new(start, stop, points)
    }
}

/// Spatial grid requested from the model instrument
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelGrid {
    pub latitude: AxisRange,
    pub longitude: AxisRange,
    pub altitude: AxisRange,
}

impl Default for ModelGrid {
    fn default() -> Self {
        Self {
            latitude: constants::model_grid::LATITUDE.into(),
            longitude: constants::model_grid::LONGITUDE.into(),
            altitude: constants::model_grid::ALTITUDE.into(),
        }
    }
}

impl ModelGrid {
    /// Validate every axis of the grid
    pub fn validate(&self) -> Result<()> {
        self.latitude.validate("latitude")?;
        self.longitude.validate("longitude")?;
        self.altitude.validate("altitude")?;
        if self.latitude.start < -90.0 || self.latitude.stop > 90.0 {
            return Err(InstrumentError::invalid_request(
                "latitude axis must lie within [-90, 90]",
            ));
        }
        Ok(())
    }
}

/// Parameters for a single load of a test instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadRequest {
    /// First day to load
    pub start: NaiveDate,
    /// Day after the last day to load; `None` loads a single day
    pub end: Option<NaiveDate>,
    /// Variant selector
    pub tag: String,
    /// Instrument ID
    pub inst_id: String,
    /// Maximum samples per day; the instrument default when `None`
    pub num_samples: Option<usize>,
    /// Offset of the first sample since midnight, in seconds
    pub start_time_seconds: Option<i64>,
    /// Produce a non-monotonic, non-unique time index
    pub malformed_index: bool,
    /// Grid for the model instrument; the default grid when `None`
    pub model_grid: Option<ModelGrid>,
}

impl LoadRequest {
    /// Request a single day of data
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: None,
            tag: String::new(),
            inst_id: String::new(),
            num_samples: None,
            start_time_seconds: None,
            malformed_index: false,
            model_grid: None,
        }
    }

    /// Request every day in `[start, end)`
    pub fn for_range(start: NaiveDate, end: NaiveDate) -> Self {
        Self::for_date(start).with_end(end)
    }

    pub fn with_end(mut self, end: NaiveDate) -> Self {
        self.end = Some(end);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_num_samples(mut self, num_samples: usize) -> Self {
        self.num_samples = Some(num_samples);
        self
    }

    pub fn with_start_time(mut self, offset: TimeDelta) -> Self {
        self.start_time_seconds = Some(offset.num_seconds());
        self
    }

    pub fn with_malformed_index(mut self) -> Self {
        self.malformed_index = true;
        self
    }

    pub fn with_model_grid(mut self, grid: ModelGrid) -> Self {
        self.model_grid = Some(grid);
        self
    }

    /// Exclusive end date, defaulting to the day after `start`
    pub fn end_date(&self) -> Result<NaiveDate> {
        match self.end {
            Some(end) => Ok(end),
            None => self.start.succ_opt().ok_or_else(|| {
                InstrumentError::invalid_request(format!("no day follows {}", self.start))
            }),
        }
    }

    /// Days covered by the request
    pub fn days(&self) -> Result<Vec<NaiveDate>> {
        let end = self.end_date()?;
        if end <= self.start {
            return Err(InstrumentError::invalid_request(format!(
                "empty time range: start {} is not before end {}",
                self.start, end
            )));
        }
        Ok(self.start.iter_days().take_while(|day| *day < end).collect())
    }

    /// Samples per day for the given instrument
    pub fn samples_per_day(&self, kind: InstrumentKind) -> usize {
        self.num_samples.unwrap_or_else(|| kind.default_num_samples())
    }

    /// Offset of the first sample since midnight
    pub fn start_offset(&self) -> TimeDelta {
        TimeDelta::seconds(self.start_time_seconds.unwrap_or(0))
    }

    /// Validate the request against an instrument's capabilities
    pub fn validate(&self, kind: InstrumentKind) -> Result<()> {
        self.days()?;
        kind.validate_tag(&self.tag)?;

        if !INST_IDS.contains(&self.inst_id.as_str()) {
            return Err(InstrumentError::invalid_request(format!(
                "unknown inst_id '{}' for {}",
                self.inst_id, kind
            )));
        }

        if self.num_samples == Some(0) {
            return Err(InstrumentError::invalid_request(
                "num_samples must be greater than zero",
            ));
        }

        if let Some(offset) = self.start_time_seconds {
            if !(0..SECONDS_PER_DAY).contains(&offset) {
                return Err(InstrumentError::invalid_request(format!(
                    "start_time offset of {}s must fall within one day",
                    offset
                )));
            }
        }

        if let Some(grid) = &self.model_grid {
            grid.validate()?;
        }

        Ok(())
    }
}

/// Batch generation statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub files_generated: usize,
    /// Existing outputs left in place
    pub files_skipped: usize,
    pub files_failed: usize,
    pub total_samples: usize,
    pub output_dir: PathBuf,
    pub processing_time_ms: u128,
    pub output_sizes: Vec<(String, u64)>,
}

impl ProcessingStats {
    /// Total bytes written
    pub fn total_output_size(&self) -> u64 {
        self.output_sizes.iter().map(|(_, size)| size).sum()
    }

    /// Format a byte count in human-readable form
    pub fn format_size(bytes: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = bytes as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", bytes, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }
}
