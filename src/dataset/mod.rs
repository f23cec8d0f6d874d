//! Generated datasets and their containers.
//!
//! A [`Dataset`] pairs one of the two container layouts with its metadata
//! and the sample index it was generated on:
//!
//! - [`tabular`] - polars frames, one row per sample
//! - [`labeled`] - ndarray variables over named dimensions

pub mod labeled;
pub mod tabular;

pub use labeled::{LabeledDataset, Values, Variable};
pub use tabular::{TabularBuilder, row_shape};

use crate::constants::EPOCH_NAME;
use crate::error::{InstrumentError, Result};
use crate::meta::Meta;
use crate::models::{ContainerFormat, InstrumentKind};
use chrono::NaiveDateTime;
use polars::prelude::*;

/// Storage for a generated dataset
#[derive(Debug, Clone)]
pub enum Container {
    Tabular(DataFrame),
    Labeled(LabeledDataset),
}

/// A generated, immutable dataset
#[derive(Debug, Clone)]
pub struct Dataset {
    pub kind: InstrumentKind,
    pub tag: String,
    /// Sample times, in load order (may be malformed on request)
    pub index: Vec<NaiveDateTime>,
    pub container: Container,
    pub meta: Meta,
}

impl Dataset {
    /// Number of samples along the time axis
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn format(&self) -> ContainerFormat {
        match self.container {
            Container::Tabular(_) => ContainerFormat::Tabular,
            Container::Labeled(_) => ContainerFormat::LabeledArray,
        }
    }

    pub fn frame(&self) -> Option<&DataFrame> {
        match &self.container {
            Container::Tabular(df) => Some(df),
            Container::Labeled(_) => None,
        }
    }

    pub fn labeled(&self) -> Option<&LabeledDataset> {
        match &self.container {
            Container::Labeled(ds) => Some(ds),
            Container::Tabular(_) => None,
        }
    }

    /// Variable names, excluding the time index
    pub fn variable_names(&self) -> Vec<String> {
        match &self.container {
            Container::Tabular(df) => df
                .get_column_names()
                .into_iter()
                .filter(|name| name.as_str() != EPOCH_NAME)
                .map(|name| name.to_string())
                .collect(),
            Container::Labeled(ds) => ds.variables().map(|(name, _)| name.to_string()).collect(),
        }
    }

    fn unknown_variable(&self, name: &str) -> InstrumentError {
        InstrumentError::invalid_request(format!(
            "unknown variable name '{}' for {}",
            name, self.kind
        ))
    }

    /// Values of a one-dimensional variable as floating point
    pub fn column_f64(&self, name: &str) -> Result<Vec<f64>> {
        match &self.container {
            Container::Tabular(df) => {
                let column = df
                    .column(name)
                    .map_err(|_| self.unknown_variable(name))?;
                let series = column.as_materialized_series().cast(&DataType::Float64)?;
                Ok(series
                    .f64()?
                    .into_iter()
                    .map(|v| v.unwrap_or(f64::NAN))
                    .collect())
            }
            Container::Labeled(ds) => {
                let variable = ds.get(name).ok_or_else(|| self.unknown_variable(name))?;
                if variable.values.ndim() != 1 {
                    return Err(InstrumentError::shape_mismatch(
                        name,
                        &[variable.shape().iter().product()],
                        variable.shape(),
                    ));
                }
                Ok(variable.values.to_f64().iter().copied().collect())
            }
        }
    }

    /// Shape of a variable's payload for a single sample.
    ///
    /// Every sample is checked to carry the same shape. Scalars return an
    /// empty shape.
    pub fn payload_shape(&self, name: &str) -> Result<Vec<usize>> {
        match &self.container {
            Container::Tabular(df) => {
                let column = df
                    .column(name)
                    .map_err(|_| self.unknown_variable(name))?;
                row_shape(column.as_materialized_series())
            }
            Container::Labeled(ds) => {
                let variable = ds.get(name).ok_or_else(|| self.unknown_variable(name))?;
                if variable.is_time_indexed() {
                    Ok(variable.shape()[1..].to_vec())
                } else {
                    Ok(variable.shape().to_vec())
                }
            }
        }
    }

    /// Tabular view of the dataset, flattening labeled arrays as needed
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        match &self.container {
            Container::Tabular(df) => Ok(df.clone()),
            Container::Labeled(ds) => ds.to_dataframe(),
        }
    }

    /// Content equality, including the container layout
    pub fn equals(&self, other: &Dataset) -> bool {
        if self.kind != other.kind || self.tag != other.tag || self.index != other.index {
            return false;
        }
        match (&self.container, &other.container) {
            (Container::Tabular(a), Container::Tabular(b)) => a.equals_missing(b),
            (Container::Labeled(a), Container::Labeled(b)) => a == b,
            _ => false,
        }
    }

    pub fn is_monotonic_index(&self) -> bool {
        self.index.windows(2).all(|w| w[0] <= w[1])
    }

    pub fn is_unique_index(&self) -> bool {
        let mut sorted = self.index.clone();
        sorted.sort();
        sorted.windows(2).all(|w| w[0] != w[1])
    }
}
