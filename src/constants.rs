//! Application constants for the synthetic test instruments
//!
//! This module contains orbit periods, signal ranges, payload shapes and
//! other default values shared by every generator.

use chrono::NaiveDate;

// =============================================================================
// Platform and Instrument Names
// =============================================================================

/// Platform shared by every test instrument
pub const PLATFORM: &str = "pysat";

/// Name of the time (epoch) dimension and column
pub const EPOCH_NAME: &str = "time";

/// Acknowledgement text attached to every generated dataset
pub const ACKNOWLEDGEMENTS: &str =
    "Test instruments provided through the pysat project. https://www.github.com/pysat/pysat";

/// Extension used for fake data files
pub const FAKE_FILE_EXTENSION: &str = "nofile";

// =============================================================================
// Reference Dates
// =============================================================================

/// Start of the first simulated orbit (year, month, day)
const ROOT_DATE_YMD: (i32, u32, u32) = (2009, 1, 1);

/// Test date used for default file listings (year, month, day)
const TEST_DATE_YMD: (i32, u32, u32) = (2009, 1, 1);

/// Date every orbit signal is phased against
pub fn root_date() -> NaiveDate {
    let (y, m, d) = ROOT_DATE_YMD;
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

/// Default date for loading and listing test files
pub fn test_date() -> NaiveDate {
    let (y, m, d) = TEST_DATE_YMD;
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

/// Seconds in one day
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Last second offset that still belongs to a day
pub const LAST_SECOND_OF_DAY: i64 = SECONDS_PER_DAY - 1;

// =============================================================================
// Orbit Signal Periods and Ranges
// =============================================================================

/// Signal periods in seconds.
///
/// Local time and longitude are slightly out of sync to simulate the
/// rotation of the Earth beneath the orbit.
pub mod periods {
    /// Local time period (97 minutes)
    pub const LOCAL_TIME: f64 = 5820.0;

    /// Longitude period (104 minutes)
    pub const LONGITUDE: f64 = 6240.0;

    /// Orbit angle period, used to derive latitude
    pub const ANGLE: f64 = 5820.0;
}

/// Value ranges cycled over one period
pub mod ranges {
    pub const LOCAL_TIME: (f64, f64) = (0.0, 24.0);
    pub const LONGITUDE: (f64, f64) = (0.0, 360.0);
    pub const ANGLE: (f64, f64) = (0.0, 2.0 * std::f64::consts::PI);
    pub const LATITUDE: (f64, f64) = (-90.0, 90.0);
}

/// Solar local time leads magnetic local time by this many seconds
pub const SLT_OFFSET_SECONDS: f64 = 20.0;

/// Constant satellite altitude in km (no orbital decay)
pub const SATELLITE_ALTITUDE_KM: f64 = 400.0;

/// Peak latitude of the simulated polar orbit
pub const MAX_LATITUDE: f64 = 90.0;

/// Hours added to mlt by the `mlt_offset` tag
pub const MLT_TAG_OFFSET_HOURS: f64 = 5.0;

// =============================================================================
// Sampling Defaults
// =============================================================================

/// Sample frequency (seconds) and default samples per day for 1 Hz instruments
pub const HIGH_RATE_FREQ_SECONDS: i64 = 1;
pub const HIGH_RATE_NUM_SAMPLES: usize = 86_400;

/// 100 s frequency keeps profile and image instruments small enough for
/// seasonal analysis tests
pub const PROFILE_RATE_FREQ_SECONDS: i64 = 100;
pub const PROFILE_RATE_NUM_SAMPLES: usize = 864;

/// Model output every 15 minutes
pub const MODEL_FREQ_SECONDS: i64 = 900;
pub const MODEL_NUM_SAMPLES: usize = 96;

/// Minimum number of samples needed to build a malformed index
pub const MALFORMED_INDEX_MIN_SAMPLES: usize = 9;

// =============================================================================
// Payload Shapes
// =============================================================================

/// Length of every altitude profile
pub const PROFILE_LENGTH: usize = 15;

/// Image shape (x, y)
pub const IMAGE_SHAPE: (usize, usize) = (17, 17);

/// Length of the `z` dimension used by variable-height profiles
pub const Z_LENGTH: usize = 15;

// =============================================================================
// Model Grid Defaults
// =============================================================================

/// Default model grid axes as (start, stop, points), stop inclusive
pub mod model_grid {
    pub const LATITUDE: (f64, f64, usize) = (-50.0, 50.0, 21);
    pub const LONGITUDE: (f64, f64, usize) = (0.0, 356.0, 90);
    pub const ALTITUDE: (f64, f64, usize) = (300.0, 500.0, 41);

    /// Offset between model slt and mlt in hours
    pub const MLT_OFFSET_HOURS: f64 = 0.2;
}

// =============================================================================
// File Listing
// =============================================================================

/// Years listed before the test date when no range is given
pub const FILE_LIST_YEARS_BEFORE: i32 = 1;

/// Years listed after the test date when no range is given
pub const FILE_LIST_YEARS_AFTER: i32 = 2;

/// Shift applied to file timestamps when the listing is mangled
pub const MANGLED_FILE_OFFSET_MINUTES: i64 = 5;

// =============================================================================
// Metadata
// =============================================================================

/// Label text used for the epoch variable
pub const EPOCH_LABEL: &str = "Milliseconds since 1970-1-1 00:00:00";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_dates() {
        assert_eq!(root_date(), NaiveDate::from_ymd_opt(2009, 1, 1).unwrap());
        assert_eq!(test_date(), root_date());
    }

    #[test]
    fn test_default_sample_counts_fit_in_a_day() {
        assert_eq!(
            HIGH_RATE_NUM_SAMPLES as i64 * HIGH_RATE_FREQ_SECONDS,
            SECONDS_PER_DAY
        );
        assert_eq!(
            PROFILE_RATE_NUM_SAMPLES as i64 * PROFILE_RATE_FREQ_SECONDS,
            SECONDS_PER_DAY
        );
        assert_eq!(
            MODEL_NUM_SAMPLES as i64 * MODEL_FREQ_SECONDS,
            SECONDS_PER_DAY
        );
    }
}
