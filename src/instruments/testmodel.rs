//! `pysat_testmodel`: a 4D model field over time, altitude, latitude and
//! longitude.
//!
//! Values are simple functions of universal time and the grid position, so
//! any grid point can be checked by hand:
//!
//! - `slt = (uts / 3600 + longitude / 15) mod 24`
//! - `mlt = (slt + 0.2) mod 24`
//! - `dummy1 = slt + latitude / 90`
//! - `dummy2 = dummy1 + (altitude - 300) / 100`

use super::sample_axis;
use crate::constants::{EPOCH_NAME, model_grid};
use crate::dataset::{Container, Dataset, LabeledDataset};
use crate::error::Result;
use crate::models::{InstrumentKind, LoadRequest};
use ndarray::{Array2, Array3, Array4};

const HOURS_PER_DAY: f64 = 24.0;

pub fn load(request: &LoadRequest) -> Result<Dataset> {
    let kind = InstrumentKind::TestModel;
    let grid = request.model_grid.unwrap_or_default();
    grid.validate()?;

    let axis = sample_axis(kind, request)?;
    let latitude = grid.latitude.values();
    let longitude = grid.longitude.values();
    let altitude = grid.altitude.values();
    let (nt, nalt, nlat, nlon) = (axis.len(), altitude.len(), latitude.len(), longitude.len());

    let slt = Array2::from_shape_fn((nt, nlon), |(t, j)| {
        (axis.uts[t] / 3600.0 + longitude[j] / 15.0).rem_euclid(HOURS_PER_DAY)
    });
    let mlt = slt.mapv(|v| (v + model_grid::MLT_OFFSET_HOURS).rem_euclid(HOURS_PER_DAY));
    let dummy1 = Array3::from_shape_fn((nt, nlat, nlon), |(t, i, j)| {
        slt[[t, j]] + latitude[i] / 90.0
    });
    let base_altitude = model_grid::ALTITUDE.0;
    let dummy2 = Array4::from_shape_fn((nt, nalt, nlat, nlon), |(t, a, i, j)| {
        dummy1[[t, i, j]] + (altitude[a] - base_altitude) / 100.0
    });

    let mut data = LabeledDataset::new(axis.index.clone());
    data.add_coord("latitude", &["latitude"], latitude)?;
    data.add_coord("longitude", &["longitude"], longitude)?;
    data.add_coord("altitude", &["altitude"], altitude)?;

    data.add_var("uts", &[EPOCH_NAME], axis.uts.clone())?;
    data.add_var("slt", &[EPOCH_NAME, "longitude"], slt.into_dyn())?;
    data.add_var("mlt", &[EPOCH_NAME, "longitude"], mlt.into_dyn())?;
    data.add_var("dummy1", &[EPOCH_NAME, "latitude", "longitude"], dummy1.into_dyn())?;
    data.add_var(
        "dummy2",
        &[EPOCH_NAME, "altitude", "latitude", "longitude"],
        dummy2.into_dyn(),
    )?;

    let meta = data.describe();
    Ok(Dataset {
        kind,
        tag: request.tag.clone(),
        index: axis.index,
        container: Container::Labeled(data),
        meta,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AxisRange, ModelGrid};
    use chrono::NaiveDate;

    fn small_grid() -> ModelGrid {
        ModelGrid {
            latitude: AxisRange::new(-45.0, 45.0, 3),
            longitude: AxisRange::new(0.0, 180.0, 4),
            altitude: AxisRange::new(300.0, 400.0, 2),
        }
    }

    #[test]
    fn test_field_values() {
        let request = LoadRequest::for_date(NaiveDate::from_ymd_opt(2009, 1, 1).unwrap())
            .with_num_samples(5)
            .with_model_grid(small_grid());
        let ds = load(&request).unwrap();
        let data = ds.labeled().unwrap();

        let dummy2 = data.get("dummy2").unwrap();
        assert_eq!(dummy2.shape(), &[5, 2, 3, 4]);
        let dummy2 = dummy2.values.as_float().unwrap();

        // t = 900 s, altitude 400, latitude 45, longitude 60
        let expected = (900.0 / 3600.0 + 60.0 / 15.0) + 45.0 / 90.0 + 1.0;
        assert!((dummy2[[1, 1, 2, 1].as_slice()] - expected).abs() < 1e-12);

        let mlt = data.get("mlt").unwrap().values.as_float().unwrap();
        let slt = data.get("slt").unwrap().values.as_float().unwrap();
        assert!((mlt[[0, 0].as_slice()] - slt[[0, 0].as_slice()] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_default_grid() {
        let request = LoadRequest::for_date(NaiveDate::from_ymd_opt(2009, 1, 1).unwrap())
            .with_num_samples(1);
        let ds = load(&request).unwrap();
        let data = ds.labeled().unwrap();

        assert_eq!(data.dim_len("latitude"), Some(21));
        assert_eq!(data.dim_len("longitude"), Some(90));
        assert_eq!(data.dim_len("altitude"), Some(41));
        assert_eq!(ds.meta.get("dummy2").unwrap().dims.len(), 4);
    }
}
