//! Tabular container built on polars.
//!
//! One row per sample. Scalars are plain columns; profiles and images are
//! nested list columns whose every row has the same fixed shape.

use crate::constants::EPOCH_NAME;
use crate::error::{InstrumentError, Result};
use crate::meta::{Meta, describe_variable};
use chrono::NaiveDateTime;
use ndarray::{ArrayD, ArrayViewD, Axis};
use polars::prelude::*;

/// Build a column from an array whose first axis is the sample axis.
///
/// A one-dimensional array becomes a plain column; every further axis adds
/// one level of list nesting.
pub(crate) fn payload_series(name: &str, array: ArrayViewD<'_, f64>) -> Series {
    if array.ndim() <= 1 {
        return Series::new(name.into(), array.iter().copied().collect::<Vec<f64>>());
    }
    let rows: Vec<Series> = array.outer_iter().map(nested_series).collect();
    Series::new(name.into(), rows.as_slice())
}

fn nested_series(array: ArrayViewD<'_, f64>) -> Series {
    if array.ndim() <= 1 {
        return Series::new("".into(), array.iter().copied().collect::<Vec<f64>>());
    }
    let rows: Vec<Series> = array.axis_iter(Axis(0)).map(nested_series).collect();
    Series::new("".into(), rows.as_slice())
}

/// Shape of the per-row payload of a column, checking that every row agrees.
///
/// Plain columns have an empty payload shape.
pub fn row_shape(series: &Series) -> Result<Vec<usize>> {
    if !matches!(series.dtype(), DataType::List(_)) {
        return Ok(Vec::new());
    }

    let mut shape: Option<Vec<usize>> = None;
    for row in series.list()?.into_iter() {
        let row = row.ok_or_else(|| {
            InstrumentError::invalid_request(format!(
                "column '{}' has a missing payload",
                series.name()
            ))
        })?;
        let mut row_shape_full = vec![row.len()];
        row_shape_full.extend(row_shape(&row)?);

        match &shape {
            None => shape = Some(row_shape_full),
            Some(expected) if *expected != row_shape_full => {
                return Err(InstrumentError::shape_mismatch(
                    series.name().as_str(),
                    expected,
                    &row_shape_full,
                ));
            }
            Some(_) => {}
        }
    }

    Ok(shape.unwrap_or_default())
}

/// Accumulates columns for a tabular dataset with matching metadata
#[derive(Debug)]
pub struct TabularBuilder {
    rows: usize,
    columns: Vec<Column>,
    meta: Meta,
}

impl TabularBuilder {
    pub fn new(rows: usize) -> Self {
        Self {
            rows,
            columns: Vec::new(),
            meta: Meta::new(),
        }
    }

    fn check_rows(&self, name: &str, found: usize) -> Result<()> {
        if found != self.rows {
            return Err(InstrumentError::shape_mismatch(name, &[self.rows], &[found]));
        }
        Ok(())
    }

    pub fn push_f64(&mut self, name: &str, values: Vec<f64>) -> Result<&mut Self> {
        self.check_rows(name, values.len())?;
        self.meta.insert(
            name,
            describe_variable(name).with_layout(&[EPOCH_NAME], &[self.rows]),
        );
        self.columns.push(Column::new(name.into(), values));
        Ok(self)
    }

    pub fn push_i64(&mut self, name: &str, values: Vec<i64>) -> Result<&mut Self> {
        self.check_rows(name, values.len())?;
        self.meta.insert(
            name,
            describe_variable(name).with_layout(&[EPOCH_NAME], &[self.rows]),
        );
        self.columns.push(Column::new(name.into(), values));
        Ok(self)
    }

    /// Add a nested payload; `dims` names the axes after the sample axis
    pub fn push_payload(
        &mut self,
        name: &str,
        dims: &[&str],
        values: ArrayD<f64>,
    ) -> Result<&mut Self> {
        let shape = values.shape().to_vec();
        self.check_rows(name, shape.first().copied().unwrap_or(0))?;
        if shape.len() != dims.len() + 1 {
            let mut expected = vec![self.rows];
            expected.extend(std::iter::repeat_n(0, dims.len()));
            return Err(InstrumentError::shape_mismatch(name, &expected, &shape));
        }

        let mut all_dims = vec![EPOCH_NAME];
        all_dims.extend_from_slice(dims);
        self.meta
            .insert(name, describe_variable(name).with_layout(&all_dims, &shape));
        self.columns
            .push(Column::from(payload_series(name, values.view())));
        Ok(self)
    }

    /// Assemble the frame with the time column first
    pub fn finish(self, index: &[NaiveDateTime]) -> Result<(DataFrame, Meta)> {
        self.check_rows(EPOCH_NAME, index.len())?;

        let millis: Vec<i64> = index
            .iter()
            .map(|t| t.and_utc().timestamp_millis())
            .collect();
        let time = Series::new(EPOCH_NAME.into(), millis)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;

        let mut columns = Vec::with_capacity(self.columns.len() + 1);
        columns.push(Column::from(time));
        columns.extend(self.columns);

        let mut meta = self.meta;
        meta.add_epoch_metadata(EPOCH_NAME);
        if let Some(epoch) = meta.get_mut(EPOCH_NAME) {
            epoch.dims = vec![EPOCH_NAME.to_string()];
            epoch.shape = vec![index.len()];
        }

        Ok((DataFrame::new(columns)?, meta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ndarray::{Array2, Array3};

    fn index(n: usize) -> Vec<NaiveDateTime> {
        let base = NaiveDate::from_ymd_opt(2009, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        (0..n)
            .map(|i| base + chrono::TimeDelta::seconds(i as i64))
            .collect()
    }

    #[test]
    fn test_builder_produces_time_first() {
        let mut builder = TabularBuilder::new(3);
        builder.push_f64("mlt", vec![0.0, 1.0, 2.0]).unwrap();
        builder.push_i64("dummy1", vec![0, 1, 2]).unwrap();
        let (df, meta) = builder.finish(&index(3)).unwrap();

        assert_eq!(df.shape(), (3, 3));
        assert_eq!(df.get_column_names()[0].as_str(), "time");
        assert!(matches!(
            df.column("time").unwrap().dtype(),
            DataType::Datetime(TimeUnit::Milliseconds, _)
        ));
        assert_eq!(meta.get("mlt").unwrap().units, "hours");
        assert_eq!(meta.get("dummy1").unwrap().shape, vec![3]);
        assert!(meta.contains("time"));
    }

    #[test]
    fn test_row_count_mismatch() {
        let mut builder = TabularBuilder::new(3);
        let err = builder.push_f64("mlt", vec![0.0, 1.0]).unwrap_err();
        assert!(matches!(err, InstrumentError::ShapeMismatch { .. }));

        let builder = TabularBuilder::new(3);
        assert!(builder.finish(&index(2)).is_err());
    }

    #[test]
    fn test_payload_shapes() {
        let mut builder = TabularBuilder::new(4);
        builder
            .push_payload("profiles", &["profile_height"], Array2::<f64>::ones((4, 15)).into_dyn())
            .unwrap();
        builder
            .push_payload("images", &["x", "y"], Array3::<f64>::ones((4, 17, 17)).into_dyn())
            .unwrap();
        let (df, meta) = builder.finish(&index(4)).unwrap();

        let profiles = df.column("profiles").unwrap().as_materialized_series();
        assert_eq!(row_shape(profiles).unwrap(), vec![15]);
        let images = df.column("images").unwrap().as_materialized_series();
        assert_eq!(row_shape(images).unwrap(), vec![17, 17]);
        let time = df.column("time").unwrap().as_materialized_series();
        assert!(row_shape(time).unwrap().is_empty());

        assert_eq!(meta.get("images").unwrap().dims, vec!["time", "x", "y"]);
        assert_eq!(meta.get("images").unwrap().shape, vec![4, 17, 17]);
    }

    #[test]
    fn test_payload_dimension_mismatch() {
        let mut builder = TabularBuilder::new(2);
        let err = builder
            .push_payload("images", &["x"], Array3::<f64>::ones((2, 3, 3)).into_dyn())
            .unwrap_err();
        assert!(matches!(err, InstrumentError::ShapeMismatch { .. }));

        let profiles = Array2::<f64>::ones((3, 15)).into_dyn();
        assert!(builder.push_payload("profiles", &["profile_height"], profiles).is_err());
    }

    #[test]
    fn test_ragged_rows_are_detected() {
        let rows = vec![
            Series::new("".into(), vec![1.0, 2.0]),
            Series::new("".into(), vec![1.0, 2.0, 3.0]),
        ];
        let ragged = Series::new("profiles".into(), rows.as_slice());
        assert!(matches!(
            row_shape(&ragged),
            Err(InstrumentError::ShapeMismatch { .. })
        ));
    }
}
