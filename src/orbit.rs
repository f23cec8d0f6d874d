//! Simulated satellite orbit signals.
//!
//! Every instrument except the model derives its coordinates from a simple
//! polar orbit: local time and longitude cycle at slightly different
//! periods, latitude follows the cosine of the orbit angle, and altitude is
//! constant. The signal starts at the root date so that loads of
//! consecutive days join continuously.

use crate::constants::{
    MAX_LATITUDE, MLT_TAG_OFFSET_HOURS, SATELLITE_ALTITUDE_KM, SLT_OFFSET_SECONDS, periods,
    ranges,
};
use crate::error::{InstrumentError, Result};
use crate::times::SampleAxis;

/// How a fake signal evolves over time
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SignalShape {
    /// Resets to the low end of the range after every period
    Cyclic { low: f64, high: f64 },
    /// Counts completed periods
    Monotonic,
}

/// Generate fake data for the seconds in `uts`, offset by `t0` seconds.
pub fn generate_fake_data(t0: f64, uts: &[f64], period: f64, shape: SignalShape) -> Vec<f64> {
    match shape {
        SignalShape::Cyclic { low, high } => {
            let root = t0.rem_euclid(period);
            let scale = (high - low) / period;
            uts.iter()
                .map(|t| (root + t).rem_euclid(period) * scale + low)
                .collect()
        }
        SignalShape::Monotonic => uts.iter().map(|t| ((t0 + t) / period).floor()).collect(),
    }
}

fn cyclic(range: (f64, f64)) -> SignalShape {
    SignalShape::Cyclic {
        low: range.0,
        high: range.1,
    }
}

/// Variant applied to the integer test variables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrbitVariant {
    #[default]
    Regular,
    Ascend,
    Descend,
    Plus10,
    Fives,
    MltOffset,
}

impl OrbitVariant {
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "" => Ok(Self::Regular),
            "ascend" => Ok(Self::Ascend),
            "descend" => Ok(Self::Descend),
            "plus10" => Ok(Self::Plus10),
            "fives" => Ok(Self::Fives),
            "mlt_offset" => Ok(Self::MltOffset),
            other => Err(InstrumentError::invalid_request(format!(
                "no orbit variant for tag '{}'",
                other
            ))),
        }
    }
}

/// Per-sample orbit variables shared by the satellite instruments
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitTrack {
    pub uts: Vec<f64>,
    pub mlt: Vec<f64>,
    pub slt: Vec<f64>,
    pub longitude: Vec<f64>,
    pub latitude: Vec<f64>,
    pub altitude: Vec<f64>,
    pub orbit_num: Vec<i64>,
    pub dummy1: Vec<i64>,
    pub dummy2: Vec<i64>,
    pub dummy3: Vec<f64>,
    pub dummy4: Vec<f64>,
}

impl OrbitTrack {
    /// Build the track for every sample on the axis
    pub fn simulate(axis: &SampleAxis, variant: OrbitVariant) -> Self {
        let t0 = axis.orbit_offset_seconds();
        let uts = axis.uts.clone();

        let mut mlt = generate_fake_data(t0, &uts, periods::LOCAL_TIME, cyclic(ranges::LOCAL_TIME));
        let slt = generate_fake_data(
            t0 + SLT_OFFSET_SECONDS,
            &uts,
            periods::LOCAL_TIME,
            cyclic(ranges::LOCAL_TIME),
        );
        let longitude = generate_fake_data(t0, &uts, periods::LONGITUDE, cyclic(ranges::LONGITUDE));
        let latitude = generate_fake_data(t0, &uts, periods::ANGLE, cyclic(ranges::ANGLE))
            .into_iter()
            .map(|angle| MAX_LATITUDE * angle.cos())
            .collect();
        let altitude = vec![SATELLITE_ALTITUDE_KM; uts.len()];
        let orbit_num = generate_fake_data(t0, &uts, periods::LOCAL_TIME, SignalShape::Monotonic)
            .into_iter()
            .map(|n| n as i64)
            .collect();

        // Integer bins support averaging tests: local time hours and 15 degree sectors
        let mut dummy1: Vec<i64> = mlt.iter().map(|v| v.trunc() as i64).collect();
        let dummy2: Vec<i64> = longitude.iter().map(|v| (v / 15.0).trunc() as i64).collect();
        let dummy3 = dummy1
            .iter()
            .zip(&dummy2)
            .map(|(a, b)| *a as f64 + *b as f64 * 1000.0)
            .collect();
        let dummy4 = uts.clone();

        match variant {
            OrbitVariant::Regular => {}
            OrbitVariant::Ascend => dummy1 = (0..uts.len() as i64).collect(),
            OrbitVariant::Descend => dummy1 = (0..uts.len() as i64).map(|i| -i).collect(),
            OrbitVariant::Plus10 => dummy1 = (0..uts.len() as i64).map(|i| i + 10).collect(),
            OrbitVariant::Fives => dummy1 = vec![5; uts.len()],
            OrbitVariant::MltOffset => {
                for value in mlt.iter_mut() {
                    *value = (*value + MLT_TAG_OFFSET_HOURS).rem_euclid(ranges::LOCAL_TIME.1);
                }
            }
        }

        Self {
            uts,
            mlt,
            slt,
            longitude,
            latitude,
            altitude,
            orbit_num,
            dummy1,
            dummy2,
            dummy3,
            dummy4,
        }
    }

    pub fn len(&self) -> usize {
        self.uts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uts.is_empty()
    }
}
