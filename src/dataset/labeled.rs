//! Labeled multi-dimensional container.
//!
//! Variables are ndarray arrays whose axes are named dimensions. Every
//! dimension has a single length across the dataset, so adding a variable
//! whose shape disagrees with an already registered dimension fails.

use crate::constants::EPOCH_NAME;
use crate::dataset::tabular::payload_series;
use crate::error::{InstrumentError, Result};
use crate::meta::{Meta, VariableMeta, describe_variable};
use chrono::NaiveDateTime;
use ndarray::{Array1, ArrayD};
use polars::prelude::*;

/// Array storage for a variable
#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    Float(ArrayD<f64>),
    Int(ArrayD<i64>),
}

impl Values {
    pub fn shape(&self) -> &[usize] {
        match self {
            Values::Float(a) => a.shape(),
            Values::Int(a) => a.shape(),
        }
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    pub fn as_float(&self) -> Option<&ArrayD<f64>> {
        match self {
            Values::Float(a) => Some(a),
            Values::Int(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<&ArrayD<i64>> {
        match self {
            Values::Int(a) => Some(a),
            Values::Float(_) => None,
        }
    }

    /// Values as floating point, converting integers
    pub fn to_f64(&self) -> ArrayD<f64> {
        match self {
            Values::Float(a) => a.clone(),
            Values::Int(a) => a.mapv(|v| v as f64),
        }
    }
}

impl From<ArrayD<f64>> for Values {
    fn from(array: ArrayD<f64>) -> Self {
        Values::Float(array)
    }
}

impl From<ArrayD<i64>> for Values {
    fn from(array: ArrayD<i64>) -> Self {
        Values::Int(array)
    }
}

impl From<Vec<f64>> for Values {
    fn from(values: Vec<f64>) -> Self {
        Values::Float(Array1::from(values).into_dyn())
    }
}

impl From<Vec<i64>> for Values {
    fn from(values: Vec<i64>) -> Self {
        Values::Int(Array1::from(values).into_dyn())
    }
}

/// A named array with its dimension names
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub dims: Vec<String>,
    pub values: Values,
}

impl Variable {
    pub fn shape(&self) -> &[usize] {
        self.values.shape()
    }

    /// Whether the variable runs along the time dimension first
    pub fn is_time_indexed(&self) -> bool {
        self.dims.first().is_some_and(|d| d == EPOCH_NAME)
    }
}

/// Dataset of coordinates and data variables over named dimensions
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledDataset {
    time: Vec<NaiveDateTime>,
    dims: Vec<(String, usize)>,
    coords: Vec<(String, Variable)>,
    data_vars: Vec<(String, Variable)>,
}

impl LabeledDataset {
    /// Create a dataset whose `time` dimension follows `time`
    pub fn new(time: Vec<NaiveDateTime>) -> Self {
        let len = time.len();
        Self {
            time,
            dims: vec![(EPOCH_NAME.to_string(), len)],
            coords: Vec::new(),
            data_vars: Vec::new(),
        }
    }

    pub fn time(&self) -> &[NaiveDateTime] {
        &self.time
    }

    /// Dimension names and lengths in registration order
    pub fn dims(&self) -> &[(String, usize)] {
        &self.dims
    }

    pub fn dim_len(&self, name: &str) -> Option<usize> {
        self.dims
            .iter()
            .find(|(dim, _)| dim == name)
            .map(|(_, len)| *len)
    }

    fn check_layout(&mut self, name: &str, dims: &[&str], shape: &[usize]) -> Result<()> {
        if dims.len() != shape.len() {
            return Err(InstrumentError::shape_mismatch(
                name,
                &vec![0; dims.len()],
                shape,
            ));
        }

        let expected: Vec<usize> = dims
            .iter()
            .zip(shape)
            .map(|(dim, len)| self.dim_len(dim).unwrap_or(*len))
            .collect();
        if expected != shape {
            return Err(InstrumentError::shape_mismatch(name, &expected, shape));
        }

        for (dim, len) in dims.iter().zip(shape) {
            if self.dim_len(dim).is_none() {
                self.dims.push((dim.to_string(), *len));
            }
        }
        Ok(())
    }

    fn build(&mut self, name: &str, dims: &[&str], values: Values) -> Result<Variable> {
        let shape = values.shape().to_vec();
        self.check_layout(name, dims, &shape)?;
        Ok(Variable {
            dims: dims.iter().map(|d| d.to_string()).collect(),
            values,
        })
    }

    /// Add or replace a coordinate
    pub fn add_coord(
        &mut self,
        name: &str,
        dims: &[&str],
        values: impl Into<Values>,
    ) -> Result<()> {
        let variable = self.build(name, dims, values.into())?;
        upsert(&mut self.coords, name, variable);
        Ok(())
    }

    /// Add or replace a data variable
    pub fn add_var(&mut self, name: &str, dims: &[&str], values: impl Into<Values>) -> Result<()> {
        let variable = self.build(name, dims, values.into())?;
        upsert(&mut self.data_vars, name, variable);
        Ok(())
    }

    /// Look up a data variable, then a coordinate
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.data_vars
            .iter()
            .chain(self.coords.iter())
            .find(|(key, _)| key == name)
            .map(|(_, var)| var)
    }

    pub fn is_coord(&self, name: &str) -> bool {
        self.coords.iter().any(|(key, _)| key == name)
    }

    pub fn data_var_names(&self) -> impl Iterator<Item = &str> {
        self.data_vars.iter().map(|(key, _)| key.as_str())
    }

    pub fn coord_names(&self) -> impl Iterator<Item = &str> {
        self.coords.iter().map(|(key, _)| key.as_str())
    }

    /// Every variable, data variables first
    pub fn variables(&self) -> impl Iterator<Item = (&str, &Variable)> {
        self.data_vars
            .iter()
            .chain(self.coords.iter())
            .map(|(key, var)| (key.as_str(), var))
    }

    /// Metadata for every variable, with dims and shapes taken from the arrays
    pub fn describe(&self) -> Meta {
        let mut meta = Meta::new();
        meta.insert(
            EPOCH_NAME,
            VariableMeta::new(EPOCH_NAME).with_layout(&[EPOCH_NAME], &[self.time.len()]),
        );
        meta.add_epoch_metadata(EPOCH_NAME);

        for (name, variable) in self.variables() {
            let dims: Vec<&str> = variable.dims.iter().map(|d| d.as_str()).collect();
            meta.insert(
                name,
                describe_variable(name).with_layout(&dims, variable.shape()),
            );
        }
        meta
    }

    /// Flatten into the tabular layout: one row per time sample, variables
    /// with extra dimensions become nested list columns. Variables without a
    /// time dimension are left out.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let millis: Vec<i64> = self
            .time
            .iter()
            .map(|t| t.and_utc().timestamp_millis())
            .collect();
        let time = Series::new(EPOCH_NAME.into(), millis)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;

        let mut columns = vec![Column::from(time)];
        for (name, variable) in self.variables() {
            if !variable.is_time_indexed() {
                continue;
            }
            let series = match &variable.values {
                Values::Float(a) => payload_series(name, a.view()),
                Values::Int(a) if a.ndim() == 1 => {
                    Series::new(name.into(), a.iter().copied().collect::<Vec<i64>>())
                }
                Values::Int(a) => payload_series(name, a.mapv(|v| v as f64).view()),
            };
            columns.push(Column::from(series));
        }

        Ok(DataFrame::new(columns)?)
    }
}

fn upsert(list: &mut Vec<(String, Variable)>, name: &str, variable: Variable) {
    match list.iter_mut().find(|(key, _)| key == name) {
        Some(entry) => entry.1 = variable,
        None => list.push((name.to_string(), variable)),
    }
}
