//! `pysat_testing2d`: orbit data plus altitude profiles stored as list
//! columns of fixed length.

use super::{orbit_for, push_orbit_columns};
use crate::constants::PROFILE_LENGTH;
use crate::dataset::{Container, Dataset, TabularBuilder};
use crate::error::Result;
use crate::models::{InstrumentKind, LoadRequest};
use ndarray::Array2;

pub fn load(request: &LoadRequest) -> Result<Dataset> {
    let kind = InstrumentKind::Testing2d;
    let (axis, track) = orbit_for(kind, request)?;
    let num = axis.len();

    let mut builder = TabularBuilder::new(num);
    push_orbit_columns(&mut builder, &track)?;

    let filled = Array2::from_shape_fn((num, PROFILE_LENGTH), |(i, _)| track.dummy3[i]);
    let heights = Array2::from_shape_fn((num, PROFILE_LENGTH), |(_, k)| k as f64);
    builder
        .push_payload("profiles", &["profile_height"], filled.clone().into_dyn())?
        .push_payload("variable_profiles", &["z"], filled.into_dyn())?
        .push_payload("variable_profile_height", &["z"], heights.into_dyn())?;

    let (frame, meta) = builder.finish(&axis.index)?;
    Ok(Dataset {
        kind,
        tag: request.tag.clone(),
        index: axis.index,
        container: Container::Tabular(frame),
        meta,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_profiles_follow_dummy3() {
        let request = LoadRequest::for_date(NaiveDate::from_ymd_opt(2009, 1, 1).unwrap())
            .with_num_samples(3);
        let ds = load(&request).unwrap();
        let df = ds.frame().unwrap();

        let dummy3 = ds.column_f64("dummy3").unwrap();
        let profiles = df.column("profiles").unwrap().as_materialized_series().clone();
        for (i, expected) in dummy3.iter().enumerate() {
            let row = profiles.list().unwrap().get_as_series(i).unwrap();
            assert_eq!(row.len(), PROFILE_LENGTH);
            assert!(row.f64().unwrap().into_iter().all(|v| v == Some(*expected)));
        }

        let heights = df
            .column("variable_profile_height")
            .unwrap()
            .as_materialized_series()
            .clone();
        let first = heights.list().unwrap().get_as_series(0).unwrap();
        assert_eq!(first.f64().unwrap().get(14), Some(14.0));
        assert_eq!(
            ds.meta.get("variable_profiles").unwrap().dims,
            vec!["time", "z"]
        );
    }
}
