//! Synthetic Test Instruments Library
//!
//! A Rust library for generating the deterministic pysat test instruments:
//! fake satellite, profiler, imager and model data sets used to exercise
//! data-loading pipelines without real files.
//!
//! This library provides tools for:
//! - Generating orbit-like scalar data in tabular or labeled-array layout
//! - Generating altitude profiles, images and a 4D model field
//! - Reproducing irregular inputs (malformed indexes, start-time offsets)
//! - Describing every variable with consistent metadata
//! - Longitude wrapping and solar local time derivation
//! - Writing the data sets as Parquet fixtures in parallel

pub mod config;
pub mod constants;
pub mod coords;
pub mod dataset;
pub mod error;
pub mod instruments;
pub mod meta;
pub mod models;
pub mod orbit;
pub mod processor;
pub mod times;

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use config::GeneratorConfig;
pub use dataset::Dataset;
pub use error::{InstrumentError, Result};
pub use instruments::load;
pub use meta::Meta;
pub use models::{InstrumentKind, LoadRequest};
