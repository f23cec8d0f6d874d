//! `pysat_testing2d_xarray`: orbit data, profiles and images in a labeled
//! dataset with index coordinates for every payload axis.

use super::{add_orbit_vars, orbit_for};
use crate::constants::{EPOCH_NAME, IMAGE_SHAPE, PROFILE_LENGTH, Z_LENGTH};
use crate::dataset::{Container, Dataset, LabeledDataset};
use crate::error::Result;
use crate::models::{InstrumentKind, LoadRequest};
use ndarray::{Array2, Array3};

fn index_coord(len: usize) -> Vec<i64> {
    (0..len as i64).collect()
}

pub fn load(request: &LoadRequest) -> Result<Dataset> {
    let kind = InstrumentKind::Testing2dXarray;
    let (axis, track) = orbit_for(kind, request)?;
    let num = axis.len();

    let mut data = LabeledDataset::new(axis.index.clone());
    add_orbit_vars(&mut data, &track)?;

    data.add_coord("x", &["x"], index_coord(IMAGE_SHAPE.0))?;
    data.add_coord("y", &["y"], index_coord(IMAGE_SHAPE.1))?;
    data.add_coord("z", &["z"], index_coord(Z_LENGTH))?;
    data.add_coord("profile_height", &["profile_height"], index_coord(PROFILE_LENGTH))?;

    let profiles = Array2::from_shape_fn((num, PROFILE_LENGTH), |(i, _)| track.dummy3[i]);
    data.add_var(
        "profiles",
        &[EPOCH_NAME, "profile_height"],
        profiles.into_dyn(),
    )?;

    let variable_profiles = Array2::from_shape_fn((num, Z_LENGTH), |(i, _)| track.dummy3[i]);
    data.add_var("variable_profiles", &[EPOCH_NAME, "z"], variable_profiles.into_dyn())?;
    let heights = Array2::from_shape_fn((num, Z_LENGTH), |(_, k)| k as f64);
    data.add_coord("variable_profile_height", &[EPOCH_NAME, "z"], heights.into_dyn())?;

    let image_shape = (num, IMAGE_SHAPE.0, IMAGE_SHAPE.1);
    let images = Array3::from_shape_fn(image_shape, |(i, _, _)| track.dummy3[i]);
    data.add_var("images", &[EPOCH_NAME, "x", "y"], images.into_dyn())?;
    let pixels = Array3::from_shape_fn(image_shape, |(_, _, k)| k as f64);
    data.add_coord("image_lat", &[EPOCH_NAME, "x", "y"], pixels.clone().into_dyn())?;
    data.add_coord("image_lon", &[EPOCH_NAME, "x", "y"], pixels.into_dyn())?;

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
    use chrono::NaiveDate;

    #[test]
    fn test_layout() {
        let request = LoadRequest::for_date(NaiveDate::from_ymd_opt(2009, 1, 1).unwrap())
            .with_num_samples(4);
        let ds = load(&request).unwrap();
        let data = ds.labeled().unwrap();

        assert_eq!(data.dim_len("time"), Some(4));
        assert_eq!(data.dim_len("x"), Some(17));
        assert_eq!(data.dim_len("z"), Some(15));
        assert_eq!(data.dim_len("profile_height"), Some(15));
        assert!(data.is_coord("image_lat"));
        assert!(!data.is_coord("images"));
        assert_eq!(data.get("images").unwrap().shape(), &[4, 17, 17]);
        assert_eq!(ds.payload_shape("variable_profiles").unwrap(), vec![15]);
        assert_eq!(ds.payload_shape("x").unwrap(), vec![17]);
    }
}
