//! Error handling for synthetic instrument generation.
//!
//! Provides error types with context for invalid load requests, payload
//! shape mismatches, and failures while writing generated fixtures.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InstrumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("Shape mismatch for variable '{variable}': expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        variable: String,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("Unknown instrument: {name}")]
    UnknownInstrument { name: String },

    #[error("Unknown tag '{tag}' for instrument {instrument}")]
    UnknownTag { instrument: String, tag: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Processing failed for {path} - {reason}")]
    ProcessingFailed { path: PathBuf, reason: String },

    #[error("Processing interrupted: {reason}")]
    Interrupted { reason: String },
}

impl InstrumentError {
    /// Create an invalid request error
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Create a shape mismatch error
    pub fn shape_mismatch(
        variable: impl Into<String>,
        expected: &[usize],
        found: &[usize],
    ) -> Self {
        Self::ShapeMismatch {
            variable: variable.into(),
            expected: expected.to_vec(),
            found: found.to_vec(),
        }
    }

    /// Whether this error was caused by the caller's request rather than a failure
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest { .. } | Self::UnknownTag { .. } | Self::UnknownInstrument { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, InstrumentError>;
