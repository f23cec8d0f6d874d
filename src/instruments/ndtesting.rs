//! `pysat_ndtesting`: orbit data plus 17 x 17 images per sample in a
//! tabular container.

use super::{orbit_for, push_orbit_columns};
use crate::constants::IMAGE_SHAPE;
use crate::dataset::{Container, Dataset, TabularBuilder};
use crate::error::Result;
use crate::models::{InstrumentKind, LoadRequest};
use ndarray::Array3;

pub fn load(request: &LoadRequest) -> Result<Dataset> {
    let kind = InstrumentKind::NdTesting;
    let (axis, track) = orbit_for(kind, request)?;
    let num = axis.len();
    let shape = (num, IMAGE_SHAPE.0, IMAGE_SHAPE.1);

    let mut builder = TabularBuilder::new(num);
    push_orbit_columns(&mut builder, &track)?;

    // Pixel coordinates run along the last image axis
    let images = Array3::from_shape_fn(shape, |(i, _, _)| track.dummy3[i]);
    let pixels = Array3::from_shape_fn(shape, |(_, _, k)| k as f64);
    builder
        .push_payload("images", &["x", "y"], images.into_dyn())?
        .push_payload("image_lat", &["x", "y"], pixels.clone().into_dyn())?
        .push_payload("image_lon", &["x", "y"], pixels.into_dyn())?;

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
    fn test_image_payloads() {
        let request = LoadRequest::for_date(NaiveDate::from_ymd_opt(2009, 1, 1).unwrap())
            .with_num_samples(2);
        let ds = load(&request).unwrap();

        assert_eq!(ds.payload_shape("images").unwrap(), vec![17, 17]);
        assert_eq!(ds.payload_shape("image_lat").unwrap(), vec![17, 17]);
        assert!(ds.payload_shape("mlt").unwrap().is_empty());
        assert_eq!(ds.meta.keys_nd().count(), 3);
    }
}
