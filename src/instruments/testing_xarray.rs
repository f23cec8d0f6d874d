//! `pysat_testing_xarray`: the scalar orbit data of `pysat_testing` with
//! every variable on the `time` dimension of a labeled dataset.

use super::{add_orbit_vars, orbit_for};
use crate::dataset::{Container, Dataset, LabeledDataset};
use crate::error::Result;
use crate::models::{InstrumentKind, LoadRequest};

pub fn load(request: &LoadRequest) -> Result<Dataset> {
    let kind = InstrumentKind::TestingXarray;
    let (axis, track) = orbit_for(kind, request)?;

    let mut data = LabeledDataset::new(axis.index.clone());
    add_orbit_vars(&mut data, &track)?;
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
    fn test_all_variables_on_time() {
        let request = LoadRequest::for_date(NaiveDate::from_ymd_opt(2009, 1, 1).unwrap())
            .with_num_samples(6)
            .with_tag("fives");
        let ds = load(&request).unwrap();
        let data = ds.labeled().unwrap();

        assert_eq!(data.dims().len(), 1);
        assert!(data.variables().all(|(_, var)| var.dims == vec!["time"]));
        assert_eq!(ds.column_f64("dummy1").unwrap(), vec![5.0; 6]);
    }
}
