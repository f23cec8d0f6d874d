//! Coordinate utilities for generated datasets.
//!
//! Dataset operations return a new [`Dataset`]; the input is left untouched.

use crate::constants::{EPOCH_NAME, ranges};
use crate::dataset::{Container, Dataset, Values};
use crate::error::{InstrumentError, Result};
use crate::meta::describe_variable;
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use ndarray::{Array1, Array2, ArrayD};
use polars::prelude::*;
use tracing::{debug, info};

const HOURS_PER_DAY: f64 = 24.0;
const DEGREES_PER_HOUR: f64 = 15.0;

/// Wrap a single value into `[low, high)`
pub fn adjust_cyclic_value(value: f64, low: f64, high: f64) -> f64 {
    (value - low).rem_euclid(high - low) + low
}

/// Wrap every value into `[low, high)`
pub fn adjust_cyclic_data(values: &[f64], low: f64, high: f64) -> Vec<f64> {
    values
        .iter()
        .map(|v| adjust_cyclic_value(*v, low, high))
        .collect()
}

/// Wrap angles in radians into `[0, 2π)`
pub fn adjust_cyclic_radians(values: &[f64]) -> Vec<f64> {
    adjust_cyclic_data(values, 0.0, std::f64::consts::TAU)
}

fn unknown_longitude(name: &str) -> InstrumentError {
    InstrumentError::invalid_request(format!("unknown longitude variable name '{}'", name))
}

/// Return a copy of `dataset` with the longitude wrapped into `[low, high)`
pub fn update_longitude(dataset: &Dataset, lon_name: &str, low: f64, high: f64) -> Result<Dataset> {
    if high <= low {
        return Err(InstrumentError::invalid_request(format!(
            "longitude range [{}, {}) is empty",
            low, high
        )));
    }

    let mut updated = dataset.clone();
    match &mut updated.container {
        Container::Tabular(df) => {
            let lon = dataset.column_f64(lon_name).map_err(|_| unknown_longitude(lon_name))?;
            let wrapped = Series::new(lon_name.into(), adjust_cyclic_data(&lon, low, high));
            df.with_column(wrapped)?;
        }
        Container::Labeled(data) => {
            let variable = data.get(lon_name).ok_or_else(|| unknown_longitude(lon_name))?;
            let dims: Vec<String> = variable.dims.clone();
            let dims: Vec<&str> = dims.iter().map(|d| d.as_str()).collect();
            let wrapped = variable
                .values
                .to_f64()
                .mapv(|v| adjust_cyclic_value(v, low, high));

            if data.is_coord(lon_name) {
                data.add_coord(lon_name, &dims, wrapped)?;
            } else {
                data.add_var(lon_name, &dims, wrapped)?;
            }
        }
    }

    if let Some(meta) = updated.meta.get_mut(lon_name) {
        meta.value_min = low;
        meta.value_max = high;
    }
    debug!("Wrapped '{}' into [{}, {})", lon_name, low, high);
    Ok(updated)
}

/// Universal time of each sample in hours, counted from `ref_date` when
/// given, otherwise from midnight of each sample's own day
fn ut_hours(index: &[NaiveDateTime], ref_date: Option<NaiveDate>) -> Vec<f64> {
    index
        .iter()
        .map(|t| match ref_date {
            Some(day) => {
                let midnight = day.and_hms_opt(0, 0, 0).unwrap_or_default();
                (*t - midnight).num_milliseconds() as f64 / 3_600_000.0
            }
            None => {
                t.num_seconds_from_midnight() as f64 / 3600.0
                    + t.nanosecond() as f64 / 3.6e12
            }
        })
        .collect()
}

fn local_time(ut: f64, lon: f64, apply_modulus: bool) -> f64 {
    let lon = adjust_cyclic_value(lon, ranges::LONGITUDE.0, ranges::LONGITUDE.1);
    let slt = ut + lon / DEGREES_PER_HOUR;
    if apply_modulus {
        slt.rem_euclid(HOURS_PER_DAY)
    } else {
        slt
    }
}

/// Return a copy of `dataset` with solar local time stored as `slt_name`.
///
/// Longitude may be a per-sample variable, a single value, or a coordinate
/// with its own dimension; the latter produces a `(time, lon)` result.
/// Without `apply_modulus` the hours keep counting from the first loaded
/// day, or from `ref_date` when one is given.
pub fn calc_solar_local_time(
    dataset: &Dataset,
    lon_name: &str,
    slt_name: &str,
    apply_modulus: bool,
    ref_date: Option<NaiveDate>,
) -> Result<Dataset> {
    let ref_date = match ref_date {
        Some(_) if apply_modulus => {
            info!("Keyword `ref_date` only supported if `apply_modulus` is false, ignoring it");
            None
        }
        Some(day) => Some(day),
        None if apply_modulus => None,
        None => dataset.index.iter().min().map(|t| t.date()),
    };
    let ut = ut_hours(&dataset.index, ref_date);

    let mut updated = dataset.clone();
    let dims: Vec<String> = match &mut updated.container {
        Container::Tabular(df) => {
            let lon = dataset.column_f64(lon_name).map_err(|_| unknown_longitude(lon_name))?;
            let slt: Vec<f64> = ut
                .iter()
                .zip(&lon)
                .map(|(ut, lon)| local_time(*ut, *lon, apply_modulus))
                .collect();
            df.with_column(Series::new(slt_name.into(), slt))?;
            vec![EPOCH_NAME.to_string()]
        }
        Container::Labeled(data) => {
            let variable = data.get(lon_name).ok_or_else(|| unknown_longitude(lon_name))?;
            let lon = variable.values.to_f64();
            let (dims, slt) = broadcast_slt(&ut, &variable.dims, &lon, apply_modulus, lon_name)?;
            let dim_refs: Vec<&str> = dims.iter().map(|d| d.as_str()).collect();
            data.add_var(slt_name, &dim_refs, Values::Float(slt))?;
            dims
        }
    };

    let mut shape = vec![updated.len()];
    if let Some(labeled) = updated.labeled() {
        shape = dims
            .iter()
            .map(|d| labeled.dim_len(d).unwrap_or(0))
            .collect();
    }
    let dim_refs: Vec<&str> = dims.iter().map(|d| d.as_str()).collect();
    let mut meta = describe_variable("slt").with_layout(&dim_refs, &shape);
    meta.long_name = slt_name.to_string();
    if !apply_modulus {
        meta.value_max = f64::NAN;
    }
    updated.meta.insert(slt_name, meta);

    debug!("Computed '{}' from '{}'", slt_name, lon_name);
    Ok(updated)
}

fn broadcast_slt(
    ut: &[f64],
    lon_dims: &[String],
    lon: &ArrayD<f64>,
    apply_modulus: bool,
    lon_name: &str,
) -> Result<(Vec<String>, ArrayD<f64>)> {
    match lon_dims {
        [] => {
            let value = lon.iter().next().copied().unwrap_or(f64::NAN);
            let slt = Array1::from_iter(ut.iter().map(|t| local_time(*t, value, apply_modulus)));
            Ok((vec![EPOCH_NAME.to_string()], slt.into_dyn()))
        }
        [dim] if dim == EPOCH_NAME => {
            let slt = Array1::from_iter(
                ut.iter()
                    .zip(lon.iter())
                    .map(|(t, lon)| local_time(*t, *lon, apply_modulus)),
            );
            Ok((vec![EPOCH_NAME.to_string()], slt.into_dyn()))
        }
        [dim] => {
            let lon: Vec<f64> = lon.iter().copied().collect();
            let slt = Array2::from_shape_fn((ut.len(), lon.len()), |(t, j)| {
                local_time(ut[t], lon[j], apply_modulus)
            });
            Ok((vec![EPOCH_NAME.to_string(), dim.clone()], slt.into_dyn()))
        }
        _ => Err(InstrumentError::invalid_request(format!(
            "longitude '{}' must be one-dimensional",
            lon_name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruments::load;
    use crate::models::{AxisRange, InstrumentKind, LoadRequest, ModelGrid};
    use chrono::TimeDelta;
    use ndarray::IxDyn;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2009, 1, 1).unwrap()
    }

    #[test]
    fn test_adjust_cyclic_data() {
        let values = [-190.0, -180.0, 0.0, 179.9, 180.0, 540.0];
        let wrapped = adjust_cyclic_data(&values, -180.0, 180.0);
        assert!(wrapped.iter().all(|v| (-180.0..180.0).contains(v)));
        assert_eq!(wrapped[0], 170.0);
        assert_eq!(wrapped[4], -180.0);

        let radians = adjust_cyclic_data(&[7.0, -1.0], 0.0, 2.0 * std::f64::consts::PI);
        assert!(radians.iter().all(|v| (0.0..2.0 * std::f64::consts::PI).contains(v)));
    }

    #[test]
    fn test_adjust_cyclic_radians() {
        use std::f64::consts::{PI, TAU};

        let wrapped = adjust_cyclic_radians(&[-PI, 0.0, TAU, 3.0 * PI]);
        let expected = [PI, 0.0, 0.0, PI];
        for (value, expected) in wrapped.iter().zip(expected) {
            assert!((value - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_update_longitude_both_containers() {
        for kind in [InstrumentKind::Testing, InstrumentKind::TestingXarray] {
            let ds = load(kind, &LoadRequest::for_date(day()).with_num_samples(7000)).unwrap();
            let updated = update_longitude(&ds, "longitude", -180.0, 180.0).unwrap();

            let lon = updated.column_f64("longitude").unwrap();
            assert!(lon.iter().all(|v| (-180.0..180.0).contains(v)));
            assert!(lon.iter().any(|v| *v < 0.0));

            // Source dataset is unchanged
            let original = ds.column_f64("longitude").unwrap();
            assert!(original.iter().all(|v| (0.0..360.0).contains(v)));
        }
    }

    #[test]
    fn test_bad_longitude_name() {
        let request = LoadRequest::for_date(day()).with_num_samples(3);
        let ds = load(InstrumentKind::Testing, &request).unwrap();
        let err = update_longitude(&ds, "not longitude", -180.0, 180.0).unwrap_err();
        assert!(err.to_string().contains("unknown longitude variable name"));
        assert!(calc_solar_local_time(&ds, "not longitude", "slt", true, None).is_err());
    }

    #[test]
    fn test_slt_matches_longitude_at_midnight() {
        for kind in [InstrumentKind::Testing, InstrumentKind::TestingXarray] {
            let ds = load(kind, &LoadRequest::for_date(day()).with_num_samples(1)).unwrap();
            let updated = calc_solar_local_time(&ds, "longitude", "slt", true, None).unwrap();

            let slt = updated.column_f64("slt").unwrap();
            let lon = updated.column_f64("longitude").unwrap();
            let diff = (slt[0] - lon[0] / 15.0) * std::f64::consts::PI / 12.0;
            assert!(diff.sin().abs() < 1e-6);
        }
    }

    #[test]
    fn test_slt_independent_of_longitude_range() {
        let request = LoadRequest::for_date(day()).with_num_samples(500);
        let ds = load(InstrumentKind::Testing, &request).unwrap();
        let first = calc_solar_local_time(&ds, "longitude", "slt", true, None).unwrap();
        let shifted = update_longitude(&first, "longitude", -180.0, 180.0).unwrap();
        let second = calc_solar_local_time(&shifted, "longitude", "slt2", true, None).unwrap();

        let a = second.column_f64("slt").unwrap();
        let b = second.column_f64("slt2").unwrap();
        assert!(a.iter().zip(&b).all(|(a, b)| (a - b).abs() < 1e-6));
    }

    #[test]
    fn test_slt_broadcasts_over_longitude_coordinate() {
        let grid = ModelGrid {
            latitude: AxisRange::new(0.0, 0.0, 1),
            longitude: AxisRange::new(0.0, 356.0, 90),
            altitude: AxisRange::new(300.0, 300.0, 1),
        };
        let request =
            LoadRequest::for_range(day(), day() + TimeDelta::days(2)).with_model_grid(grid);
        let ds = load(InstrumentKind::TestModel, &request).unwrap();

        let modded = calc_solar_local_time(&ds, "longitude", "slt", true, None).unwrap();
        let slt = modded.labeled().unwrap().get("slt").unwrap();
        assert_eq!(slt.shape(), &[192, 90]);
        let values = slt.values.as_float().unwrap();
        assert!(values.iter().all(|v| (0.0..24.0).contains(v)));

        let raw = calc_solar_local_time(&ds, "longitude", "slt", false, None).unwrap();
        let values = raw.labeled().unwrap().get("slt").unwrap().values.to_f64();
        let max = values.iter().cloned().fold(f64::MIN, f64::max);
        let min = values.iter().cloned().fold(f64::MAX, f64::min);
        assert!(max > 48.0 && max < 72.0);
        assert!(min >= 0.0);

        let ref_date = Some(day() - TimeDelta::days(1));
        let referenced = calc_solar_local_time(&ds, "longitude", "slt", false, ref_date).unwrap();
        let values = referenced.labeled().unwrap().get("slt").unwrap().values.to_f64();
        assert!(values.iter().all(|v| *v >= 24.0 && *v < 96.0));
        assert_eq!(referenced.meta.get("slt").unwrap().shape, vec![192, 90]);
    }

    #[test]
    fn test_single_longitude_value() {
        let request = LoadRequest::for_date(day()).with_num_samples(10);
        let ds = load(InstrumentKind::TestingXarray, &request).unwrap();
        let mut with_scalar = ds.clone();
        if let Container::Labeled(data) = &mut with_scalar.container {
            data.add_coord("lon2", &[], ArrayD::from_elem(IxDyn(&[]), 10.0)).unwrap();
        }

        let updated = calc_solar_local_time(&with_scalar, "lon2", "slt", true, None).unwrap();
        let slt = updated.column_f64("slt").unwrap();
        assert_eq!(slt.len(), 10);
        assert!(slt.iter().all(|v| (0.0..24.0).contains(v)));
    }
}
