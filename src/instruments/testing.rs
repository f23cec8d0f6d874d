//! `pysat_testing`: scalar orbit data in a tabular container.

use super::{orbit_for, push_orbit_columns};
use crate::dataset::{Container, Dataset, TabularBuilder};
use crate::error::Result;
use crate::models::{InstrumentKind, LoadRequest};

pub fn load(request: &LoadRequest) -> Result<Dataset> {
    let kind = InstrumentKind::Testing;
    let (axis, track) = orbit_for(kind, request)?;

    let mut builder = TabularBuilder::new(axis.len());
    push_orbit_columns(&mut builder, &track)?;
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
    fn test_columns() {
        let request = LoadRequest::for_date(NaiveDate::from_ymd_opt(2009, 1, 1).unwrap())
            .with_num_samples(12);
        let ds = load(&request).unwrap();
        let df = ds.frame().unwrap();

        assert_eq!(df.height(), 12);
        assert_eq!(df.width(), 12);
        assert_eq!(ds.variable_names()[0], "uts");
        assert_eq!(ds.meta.len(), 12);
        assert_eq!(ds.meta.get("dummy1").unwrap().fill, -1.0);
    }
}
