//! Synthetic test instruments.
//!
//! Each submodule builds one instrument's dataset from an already validated
//! [`LoadRequest`]. [`load`] is the only entry point: it validates the
//! request and dispatches on the instrument kind. The helpers here assemble
//! the sample axis and the orbit variables that the satellite-style
//! instruments share.

pub(crate) mod ndtesting;
pub(crate) mod testing;
pub(crate) mod testing2d;
pub(crate) mod testing2d_xarray;
pub(crate) mod testing_xarray;
pub(crate) mod testmodel;

use crate::constants::EPOCH_NAME;
use crate::dataset::{Dataset, LabeledDataset, TabularBuilder};
use crate::error::{InstrumentError, Result};
use crate::models::{InstrumentKind, LoadRequest};
use crate::orbit::{OrbitTrack, OrbitVariant};
use crate::times::{SampleAxis, file_name, generate_times};
use tracing::{debug, info};

/// Generate the dataset for `kind` described by `request`
pub fn load(kind: InstrumentKind, request: &LoadRequest) -> Result<Dataset> {
    request.validate(kind)?;
    info!(
        "Loading {} from {} to {} (tag '{}')",
        kind,
        request.start,
        request.end_date()?,
        request.tag
    );

    let dataset = match kind {
        InstrumentKind::Testing => testing::load(request)?,
        InstrumentKind::TestingXarray => testing_xarray::load(request)?,
        InstrumentKind::Testing2d => testing2d::load(request)?,
        InstrumentKind::NdTesting => ndtesting::load(request)?,
        InstrumentKind::Testing2dXarray => testing2d_xarray::load(request)?,
        InstrumentKind::TestModel => testmodel::load(request)?,
    };

    debug!(
        "{} produced {} samples and {} variables",
        kind,
        dataset.len(),
        dataset.meta.len()
    );
    Ok(dataset)
}

/// Build the sample axis for a request from its fake file names
pub(crate) fn sample_axis(kind: InstrumentKind, request: &LoadRequest) -> Result<SampleAxis> {
    let file_names: Vec<String> = request
        .days()?
        .into_iter()
        .map(|day| file_name(day, None))
        .collect();

    let mut axis = generate_times(
        &file_names,
        request.samples_per_day(kind),
        kind.frequency_seconds(),
        request.start_offset(),
    )?;
    if axis.is_empty() {
        return Err(InstrumentError::invalid_request(format!(
            "no samples fall within {} to {}",
            request.start,
            request.end_date()?
        )));
    }

    if request.malformed_index {
        axis.malform()?;
        debug!("Malformed the time index of {}", kind);
    }
    Ok(axis)
}

/// Sample axis plus the orbit for the request's tag
pub(crate) fn orbit_for(
    kind: InstrumentKind,
    request: &LoadRequest,
) -> Result<(SampleAxis, OrbitTrack)> {
    let axis = sample_axis(kind, request)?;
    let track = OrbitTrack::simulate(&axis, OrbitVariant::from_tag(&request.tag)?);
    Ok((axis, track))
}

pub(crate) fn push_orbit_columns(builder: &mut TabularBuilder, track: &OrbitTrack) -> Result<()> {
    builder
        .push_f64("uts", track.uts.clone())?
        .push_f64("mlt", track.mlt.clone())?
        .push_f64("slt", track.slt.clone())?
        .push_f64("longitude", track.longitude.clone())?
        .push_f64("latitude", track.latitude.clone())?
        .push_f64("altitude", track.altitude.clone())?
        .push_i64("orbit_num", track.orbit_num.clone())?
        .push_i64("dummy1", track.dummy1.clone())?
        .push_i64("dummy2", track.dummy2.clone())?
        .push_f64("dummy3", track.dummy3.clone())?
        .push_f64("dummy4", track.dummy4.clone())?;
    Ok(())
}

pub(crate) fn add_orbit_vars(dataset: &mut LabeledDataset, track: &OrbitTrack) -> Result<()> {
    let time = [EPOCH_NAME];
    dataset.add_var("uts", &time, track.uts.clone())?;
    dataset.add_var("mlt", &time, track.mlt.clone())?;
    dataset.add_var("slt", &time, track.slt.clone())?;
    dataset.add_var("longitude", &time, track.longitude.clone())?;
    dataset.add_var("latitude", &time, track.latitude.clone())?;
    dataset.add_var("altitude", &time, track.altitude.clone())?;
    dataset.add_var("orbit_num", &time, track.orbit_num.clone())?;
    dataset.add_var("dummy1", &time, track.dummy1.clone())?;
    dataset.add_var("dummy2", &time, track.dummy2.clone())?;
    dataset.add_var("dummy3", &time, track.dummy3.clone())?;
    dataset.add_var("dummy4", &time, track.dummy4.clone())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeDelta};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2009, 1, 1).unwrap()
    }

    #[test]
    fn test_sample_axis_spans_days() {
        let request =
            LoadRequest::for_range(day(), day() + TimeDelta::days(3)).with_num_samples(10);
        let axis = sample_axis(InstrumentKind::Testing2d, &request).unwrap();
        assert_eq!(axis.len(), 30);
        assert_eq!(axis.dates.len(), 3);
        assert_eq!(axis.uts[10], 86_400.0);
    }

    #[test]
    fn test_malformed_axis_needs_nine_samples() {
        let request = LoadRequest::for_date(day())
            .with_num_samples(5)
            .with_malformed_index();
        assert!(sample_axis(InstrumentKind::Testing, &request).is_err());
    }

    #[test]
    fn test_load_validates_first() {
        let request = LoadRequest::for_date(day()).with_tag("ascend");
        let err = load(InstrumentKind::TestModel, &request).unwrap_err();
        assert!(matches!(err, InstrumentError::UnknownTag { .. }));

        let fives = LoadRequest::for_date(day()).with_num_samples(5).with_tag("fives");
        for kind in [InstrumentKind::Testing2d, InstrumentKind::Testing2dXarray] {
            let err = load(kind, &fives).unwrap_err();
            assert!(matches!(err, InstrumentError::UnknownTag { .. }));
        }
    }

    #[test]
    fn test_negative_start_offset_is_rejected() {
        let request = LoadRequest::for_date(day())
            .with_num_samples(5)
            .with_start_time(TimeDelta::seconds(-60));
        for kind in InstrumentKind::ALL {
            assert!(load(kind, &request).unwrap_err().is_invalid_request());
        }
    }
}
