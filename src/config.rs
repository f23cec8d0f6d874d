//! Configuration management and validation.
//!
//! Holds the batch generation settings: load options applied to every
//! request, Parquet output settings and the concurrency limits used by the
//! processor.

use crate::error::{InstrumentError, Result};
use crate::models::{LoadRequest, ModelGrid};
use clap::ValueEnum;
use polars::prelude::ParquetCompression;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Supported compression algorithms for parquet files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CompressionAlgorithm {
    /// Snappy compression - good balance of speed and compression
    #[default]
    Snappy,
    /// ZSTD compression - better compression ratio, slower
    Zstd,
    /// LZ4 compression - fastest, lower compression ratio
    Lz4,
    /// No compression
    #[value(name = "none")]
    Uncompressed,
}

impl CompressionAlgorithm {
    /// Convert to polars ParquetCompression type
    pub fn to_polars_compression(&self) -> ParquetCompression {
        match self {
            CompressionAlgorithm::Snappy => ParquetCompression::Snappy,
            CompressionAlgorithm::Zstd => ParquetCompression::Zstd(None),
            CompressionAlgorithm::Lz4 => ParquetCompression::Lz4Raw,
            CompressionAlgorithm::Uncompressed => ParquetCompression::Uncompressed,
        }
    }
}

/// Parquet output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParquetOutputConfig {
    /// Compression algorithm selection
    pub compression_algorithm: CompressionAlgorithm,

    /// Enable column statistics for query pruning
    pub enable_statistics: bool,

    /// Rows per row group; polars decides when `None`
    pub row_group_size: Option<usize>,

    /// Write the metadata as a JSON sidecar next to each file
    pub write_metadata_sidecar: bool,
}

impl Default for ParquetOutputConfig {
    fn default() -> Self {
        Self {
            compression_algorithm: CompressionAlgorithm::Snappy,
            enable_statistics: true,
            row_group_size: None,
            write_metadata_sidecar: true,
        }
    }
}

/// System profiling information for sizing concurrency
#[derive(Debug, Clone)]
pub struct SystemProfile {
    /// Number of CPU cores available
    pub cpu_cores: usize,
    /// Total memory in MB
    pub memory_mb: usize,
    /// Physical cores
    pub performance_cores: usize,
}

impl SystemProfile {
    /// Auto-detect system capabilities
    pub fn detect() -> Self {
        use sysinfo::System;

        let cpu_cores = num_cpus::get();
        let performance_cores = num_cpus::get_physical();

        let mut system = System::new();
        system.refresh_memory();
        let memory_mb = (system.total_memory() / 1024 / 1024) as usize;

        Self {
            cpu_cores,
            memory_mb,
            performance_cores,
        }
    }

    /// Concurrent generations the machine can take, one per physical core
    pub fn recommended_concurrency(&self) -> usize {
        self.performance_cores.max(1)
    }
}

/// Global configuration for batch fixture generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Maximum concurrent generations
    pub max_concurrent_files: usize,

    /// Samples per day; each instrument's default when `None`
    pub num_samples: Option<usize>,

    /// Offset of the first sample since midnight, in seconds
    pub start_time_seconds: Option<i64>,

    /// Produce non-monotonic, non-unique time indexes
    pub malformed_index: bool,

    /// Grid for the model instrument
    pub model_grid: Option<ModelGrid>,

    /// Force overwrite of existing output files
    pub force_overwrite: bool,

    /// Fraction of system memory in use above which concurrency is halved
    pub memory_pressure_threshold: f64,

    /// Show a progress bar while generating
    pub show_progress: bool,

    /// Parquet output settings
    pub parquet: ParquetOutputConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_files: 4,
            num_samples: None,
            start_time_seconds: None,
            malformed_index: false,
            model_grid: None,
            force_overwrite: false,
            memory_pressure_threshold: 0.85,
            show_progress: true,
            parquet: ParquetOutputConfig::default(),
        }
    }
}

impl GeneratorConfig {
    /// Load a configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        debug!("Loaded configuration from {}", path.display());
        config.validate()?;
        Ok(config)
    }

    /// Size concurrency to the detected system
    pub fn for_system(profile: &SystemProfile) -> Self {
        Self::default().with_max_concurrent_files(profile.recommended_concurrency())
    }

    /// Set maximum concurrent files
    pub fn with_max_concurrent_files(mut self, max_files: usize) -> Self {
        self.max_concurrent_files = max_files;
        self
    }

    /// Set samples per day for every instrument
    pub fn with_num_samples(mut self, num_samples: usize) -> Self {
        self.num_samples = Some(num_samples);
        self
    }

    /// Set the first sample offset since midnight
    pub fn with_start_time_seconds(mut self, seconds: i64) -> Self {
        self.start_time_seconds = Some(seconds);
        self
    }

    /// Enable malformed time indexes
    pub fn with_malformed_index(mut self) -> Self {
        self.malformed_index = true;
        self
    }

    /// Use a custom grid for the model instrument
    pub fn with_model_grid(mut self, grid: ModelGrid) -> Self {
        self.model_grid = Some(grid);
        self
    }

    /// Enable force overwriting
    pub fn with_force_overwrite(mut self) -> Self {
        self.force_overwrite = true;
        self
    }

    /// Set the parquet compression algorithm
    pub fn with_compression(mut self, compression: CompressionAlgorithm) -> Self {
        self.parquet.compression_algorithm = compression;
        self
    }

    /// Disable the progress bar
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Check the settings for consistency
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_files == 0 {
            return Err(InstrumentError::Configuration {
                message: "max_concurrent_files must be at least 1".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.memory_pressure_threshold) {
            return Err(InstrumentError::Configuration {
                message: format!(
                    "memory_pressure_threshold must lie in [0, 1], got {}",
                    self.memory_pressure_threshold
                ),
            });
        }
        if self.parquet.row_group_size == Some(0) {
            return Err(InstrumentError::Configuration {
                message: "row_group_size must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Apply the configured load options to a request
    pub fn apply_to(&self, mut request: LoadRequest) -> LoadRequest {
        if let Some(num) = self.num_samples {
            request.num_samples = Some(num);
        }
        if let Some(seconds) = self.start_time_seconds {
            request.start_time_seconds = Some(seconds);
        }
        if self.malformed_index {
            request.malformed_index = true;
        }
        if let Some(grid) = self.model_grid {
            request.model_grid = Some(grid);
        }
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = GeneratorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.parquet.compression_algorithm, CompressionAlgorithm::Snappy);
        assert!(config.num_samples.is_none());
    }

    #[test]
    fn test_builders() {
        let config = GeneratorConfig::default()
            .with_max_concurrent_files(2)
            .with_num_samples(10)
            .with_start_time_seconds(60)
            .with_compression(CompressionAlgorithm::Zstd)
            .with_malformed_index()
            .without_progress();

        assert_eq!(config.max_concurrent_files, 2);
        assert_eq!(config.num_samples, Some(10));
        assert!(!config.show_progress);
        assert!(matches!(
            config.parquet.compression_algorithm.to_polars_compression(),
            ParquetCompression::Zstd(None)
        ));
    }

    #[test]
    fn test_invalid_settings() {
        assert!(GeneratorConfig::default().with_max_concurrent_files(0).validate().is_err());

        let mut config = GeneratorConfig::default();
        config.memory_pressure_threshold = 1.5;
        assert!(matches!(
            config.validate(),
            Err(InstrumentError::Configuration { .. })
        ));
    }

    #[test]
    fn test_apply_to_request() {
        let date = NaiveDate::from_ymd_opt(2009, 1, 1).unwrap();
        let config = GeneratorConfig::default().with_num_samples(12).with_start_time_seconds(30);
        let request = config.apply_to(LoadRequest::for_date(date).with_tag("fives"));

        assert_eq!(request.num_samples, Some(12));
        assert_eq!(request.start_time_seconds, Some(30));
        assert_eq!(request.tag, "fives");
        assert!(!request.malformed_index);
    }

    #[test]
    fn test_json_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let config = GeneratorConfig::default()
            .with_num_samples(5)
            .with_compression(CompressionAlgorithm::Lz4);
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = GeneratorConfig::from_json_file(&path).unwrap();
        assert_eq!(loaded, config);

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            GeneratorConfig::from_json_file(&path),
            Err(InstrumentError::Serialization(_))
        ));
    }

    #[test]
    fn test_system_profile() {
        let profile = SystemProfile::detect();
        assert!(profile.cpu_cores > 0);
        assert!(profile.recommended_concurrency() >= 1);
        assert_eq!(
            GeneratorConfig::for_system(&profile).max_concurrent_files,
            profile.recommended_concurrency()
        );
    }
}
