//! Variable metadata attached to every generated dataset.
//!
//! Metadata is keyed case-insensitively: the case of the first insert is
//! preserved, later lookups and updates may use any case.

use crate::constants::{ACKNOWLEDGEMENTS, EPOCH_LABEL, periods, ranges};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// JSON has no NaN; unset limits and fills travel as null
mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_none()
        } else {
            serializer.serialize_some(value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}

/// Metadata for a single variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableMeta {
    pub units: String,
    pub long_name: String,
    pub notes: String,
    pub desc: String,
    #[serde(with = "nan_as_null")]
    pub value_min: f64,
    #[serde(with = "nan_as_null")]
    pub value_max: f64,
    #[serde(with = "nan_as_null")]
    pub fill: f64,
    /// Dimension names, outermost first
    pub dims: Vec<String>,
    /// Length of each dimension
    pub shape: Vec<usize>,
}

impl VariableMeta {
    /// Default labels: empty strings, NaN limits and fill, long name set to the variable name
    pub fn new(name: &str) -> Self {
        Self {
            units: String::new(),
            long_name: name.to_string(),
            notes: String::new(),
            desc: String::new(),
            value_min: f64::NAN,
            value_max: f64::NAN,
            fill: f64::NAN,
            dims: Vec::new(),
            shape: Vec::new(),
        }
    }

    /// Integer variables use -1 as their fill value
    pub fn integer(name: &str) -> Self {
        Self {
            fill: -1.0,
            ..Self::new(name)
        }
    }

    pub fn with_units(mut self, units: &str) -> Self {
        self.units = units.to_string();
        self
    }

    pub fn with_desc(mut self, desc: &str) -> Self {
        self.desc = desc.to_string();
        self
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = notes.to_string();
        self
    }

    pub fn with_limits(mut self, min: f64, max: f64) -> Self {
        self.value_min = min;
        self.value_max = max;
        self
    }

    pub fn with_layout(mut self, dims: &[&str], shape: &[usize]) -> Self {
        self.dims = dims.iter().map(|d| d.to_string()).collect();
        self.shape = shape.to_vec();
        self
    }
}

/// Metadata for every variable of a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    variables: Vec<(String, VariableMeta)>,
    pub acknowledgements: String,
}

impl Default for Meta {
    fn default() -> Self {
        Self::new()
    }
}

impl Meta {
    pub fn new() -> Self {
        Self {
            variables: Vec::new(),
            acknowledgements: ACKNOWLEDGEMENTS.to_string(),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        let lowered = name.to_lowercase();
        self.variables
            .iter()
            .position(|(key, _)| key.to_lowercase() == lowered)
    }

    /// Insert or replace metadata, keeping the case of the first insert
    pub fn insert(&mut self, name: &str, meta: VariableMeta) {
        match self.position(name) {
            Some(i) => self.variables[i].1 = meta,
            None => self.variables.push((name.to_string(), meta)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&VariableMeta> {
        self.position(name).map(|i| &self.variables[i].1)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut VariableMeta> {
        self.position(name).map(move |i| &mut self.variables[i].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Stored case of a variable name, or the input when unknown
    pub fn var_case_name(&self, name: &str) -> String {
        self.position(name)
            .map(|i| self.variables[i].0.clone())
            .unwrap_or_else(|| name.to_string())
    }

    pub fn remove(&mut self, name: &str) -> Option<VariableMeta> {
        self.position(name).map(|i| self.variables.remove(i).1)
    }

    /// Variable names in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.variables.iter().map(|(key, _)| key.as_str())
    }

    /// Variables with more than one dimension
    pub fn keys_nd(&self) -> impl Iterator<Item = &str> {
        self.variables
            .iter()
            .filter(|(_, meta)| meta.dims.len() > 1)
            .map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &VariableMeta)> {
        self.variables.iter().map(|(key, meta)| (key.as_str(), meta))
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Fill in any missing epoch labels
    pub fn add_epoch_metadata(&mut self, epoch_name: &str) {
        let mut meta = self
            .get(epoch_name)
            .cloned()
            .unwrap_or_else(|| VariableMeta::new(epoch_name));

        // The default long name is the variable name, which says nothing useful here
        if meta.long_name.is_empty() || meta.long_name == epoch_name {
            meta.long_name = EPOCH_LABEL.to_string();
        }
        for label in [&mut meta.units, &mut meta.desc, &mut meta.notes] {
            if label.is_empty() {
                *label = EPOCH_LABEL.to_string();
            }
        }

        let name = self.var_case_name(epoch_name);
        self.insert(&name, meta);
    }
}

/// Standard metadata for a variable produced by the test instruments
pub fn describe_variable(name: &str) -> VariableMeta {
    let lt_max = ranges::LOCAL_TIME.1;
    match name {
        "uts" => VariableMeta::new(name)
            .with_units("s")
            .with_desc("Universal time, seconds since midnight of the first loaded day")
            .with_notes("Continues past 86400 s across additional days"),
        "mlt" => VariableMeta::new(name)
            .with_units("hours")
            .with_desc("Magnetic local time")
            .with_notes(&format!("Cycles every {} s", periods::LOCAL_TIME))
            .with_limits(0.0, lt_max),
        "slt" => VariableMeta::new(name)
            .with_units("hours")
            .with_desc("Solar local time")
            .with_limits(0.0, lt_max),
        "longitude" => VariableMeta::new(name)
            .with_units("degrees")
            .with_desc("Geographic longitude")
            .with_notes(&format!("Cycles every {} s", periods::LONGITUDE))
            .with_limits(ranges::LONGITUDE.0, ranges::LONGITUDE.1),
        "latitude" => VariableMeta::new(name)
            .with_units("degrees")
            .with_desc("Geographic latitude")
            .with_limits(ranges::LATITUDE.0, ranges::LATITUDE.1),
        "altitude" => VariableMeta::new(name)
            .with_units("km")
            .with_desc("Height above the surface"),
        "orbit_num" => VariableMeta::integer(name)
            .with_desc("Number of completed orbits since the root date"),
        "dummy1" => VariableMeta::integer(name).with_desc("Integer magnetic local time"),
        "dummy2" => VariableMeta::integer(name).with_desc("Integer 15 degree longitude sector"),
        "dummy3" => VariableMeta::new(name).with_desc("dummy1 + 1000 * dummy2"),
        "dummy4" => VariableMeta::new(name).with_units("s").with_desc("Copy of uts"),
        "profiles" | "variable_profiles" => VariableMeta::new(name)
            .with_desc("Altitude profile filled with dummy3"),
        "profile_height" | "variable_profile_height" => VariableMeta::new(name)
            .with_units("km")
            .with_desc("Profile altitude index"),
        "images" => VariableMeta::new(name).with_desc("Image filled with dummy3"),
        "image_lat" => VariableMeta::new(name)
            .with_units("degrees")
            .with_desc("Latitude of each image pixel"),
        "image_lon" => VariableMeta::new(name)
            .with_units("degrees")
            .with_desc("Longitude of each image pixel"),
        "x" | "y" | "z" => VariableMeta::integer(name).with_desc("Index coordinate"),
        _ => {
            debug!("No standard metadata for variable '{}'", name);
            VariableMeta::new(name)
        }
    }
}
