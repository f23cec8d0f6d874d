//! Parquet writing module for generated datasets
//!
//! Tabular datasets are written as they are; labeled datasets are flattened
//! to one row per sample first. The metadata goes to a JSON sidecar so the
//! fixture can be described without opening the Parquet file.

use crate::config::ParquetOutputConfig;
use crate::dataset::Dataset;
use crate::error::{InstrumentError, Result};
use crate::meta::Meta;

use polars::prelude::{
    DataFrame, ParquetReader, ParquetWriter as PolarsParquetWriter, SerReader, StatisticsOptions,
};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Parquet writer for generated datasets
#[derive(Debug, Clone)]
pub struct ParquetWriter {
    config: ParquetOutputConfig,
}

impl ParquetWriter {
    /// Create a new Parquet writer
    pub fn new(config: ParquetOutputConfig) -> Self {
        Self { config }
    }

    /// Path of the metadata sidecar for a Parquet file
    pub fn sidecar_path(path: &Path) -> PathBuf {
        path.with_extension("meta.json")
    }

    /// Whether a previous run left a complete fixture at `path`
    pub fn is_complete(&self, path: &Path) -> bool {
        path.is_file()
            && (!self.config.write_metadata_sidecar || Self::sidecar_path(path).is_file())
    }

    /// Write a dataset, returning the number of bytes written.
    ///
    /// Both files are staged next to their targets and renamed into place
    /// once everything is written. On failure neither target is left behind.
    pub fn write_dataset(&self, dataset: &Dataset, path: &Path) -> Result<u64> {
        let sidecar = self
            .config
            .write_metadata_sidecar
            .then(|| Self::sidecar_path(path));

        let size = match self.write_staged(dataset, path, sidecar.as_deref()) {
            Ok(size) => size,
            Err(e) => {
                for target in std::iter::once(path).chain(sidecar.as_deref()) {
                    remove_quietly(&staging_path(target));
                    remove_quietly(target);
                }
                return Err(e);
            }
        };

        debug!(
            "Wrote {} rows of {} to {} ({} bytes)",
            dataset.len(),
            dataset.kind,
            path.display(),
            size
        );
        Ok(size)
    }

    fn write_staged(&self, dataset: &Dataset, path: &Path, sidecar: Option<&Path>) -> Result<u64> {
        let staged = staging_path(path);
        let mut df = dataset.to_dataframe()?;
        let size = self.write_dataframe(&mut df, &staged)?;

        if let Some(sidecar) = sidecar {
            let staged_meta = staging_path(sidecar);
            std::fs::write(&staged_meta, serde_json::to_string_pretty(&dataset.meta)?)?;
            std::fs::rename(&staged_meta, sidecar)?;
            debug!("Wrote metadata sidecar {}", sidecar.display());
        }

        std::fs::rename(&staged, path)?;
        Ok(size)
    }

    /// Write a DataFrame with the configured settings
    fn write_dataframe(&self, df: &mut DataFrame, path: &Path) -> Result<u64> {
        let file = File::create(path)?;
        let statistics = if self.config.enable_statistics {
            StatisticsOptions::full()
        } else {
            StatisticsOptions::empty()
        };

        PolarsParquetWriter::new(file)
            .with_compression(self.config.compression_algorithm.to_polars_compression())
            .with_statistics(statistics)
            .with_row_group_size(self.config.row_group_size)
            .finish(df)
            .map_err(|e| InstrumentError::ProcessingFailed {
                path: path.to_path_buf(),
                reason: format!("Failed to write parquet: {}", e),
            })?;

        Ok(std::fs::metadata(path)?.len())
    }
}

/// Hidden name a file is written under before it is moved into place
fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.partial", name))
}

fn remove_quietly(path: &Path) {
    if path.is_file() {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Could not remove {}: {}", path.display(), e);
        }
    }
}

/// Read a written fixture back into a DataFrame
pub fn read_parquet(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)?;
    Ok(ParquetReader::new(file).finish()?)
}

/// Read the metadata sidecar of a written fixture
pub fn read_metadata(path: &Path) -> Result<Meta> {
    let contents = std::fs::read_to_string(ParquetWriter::sidecar_path(path))?;
    Ok(serde_json::from_str(&contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompressionAlgorithm;
    use crate::instruments::load;
    use crate::models::{InstrumentKind, LoadRequest};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn request(num: usize) -> LoadRequest {
        LoadRequest::for_date(NaiveDate::from_ymd_opt(2009, 1, 1).unwrap()).with_num_samples(num)
    }

    #[test]
    fn test_tabular_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("testing.parquet");
        let dataset = load(InstrumentKind::Testing, &request(20)).unwrap();

        let writer = ParquetWriter::new(ParquetOutputConfig::default());
        let size = writer.write_dataset(&dataset, &path).unwrap();
        assert!(size > 0);

        let df = read_parquet(&path).unwrap();
        assert!(df.equals_missing(dataset.frame().unwrap()));

        let meta = read_metadata(&path).unwrap();
        assert_eq!(
            meta.keys().collect::<Vec<_>>(),
            dataset.meta.keys().collect::<Vec<_>>()
        );
        assert_eq!(meta.get("mlt").unwrap().units, "hours");
        assert!(meta.get("mlt").unwrap().fill.is_nan());
    }

    #[test]
    fn test_labeled_dataset_is_flattened() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("testing2d_xarray.parquet");
        let dataset = load(InstrumentKind::Testing2dXarray, &request(3)).unwrap();

        let config = ParquetOutputConfig {
            compression_algorithm: CompressionAlgorithm::Zstd,
            write_metadata_sidecar: false,
            ..Default::default()
        };
        ParquetWriter::new(config).write_dataset(&dataset, &path).unwrap();

        let df = read_parquet(&path).unwrap();
        assert_eq!(df.height(), 3);
        assert!(df.column("images").is_ok());
        // Coordinates without a time dimension are not written
        assert!(df.column("x").is_err());
        assert!(!ParquetWriter::sidecar_path(&path).exists());
    }

    #[test]
    fn test_failed_sidecar_leaves_nothing_behind() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("testing.parquet");
        std::fs::create_dir(ParquetWriter::sidecar_path(&path)).unwrap();
        let dataset = load(InstrumentKind::Testing, &request(4)).unwrap();

        let writer = ParquetWriter::new(ParquetOutputConfig::default());
        assert!(writer.write_dataset(&dataset, &path).is_err());
        assert!(!path.exists());
        assert!(!staging_path(&path).exists());
        assert!(!writer.is_complete(&path));
    }

    #[test]
    fn test_completeness_requires_sidecar() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("testing.parquet");
        let dataset = load(InstrumentKind::Testing, &request(4)).unwrap();

        let writer = ParquetWriter::new(ParquetOutputConfig::default());
        writer.write_dataset(&dataset, &path).unwrap();
        assert!(writer.is_complete(&path));

        std::fs::remove_file(ParquetWriter::sidecar_path(&path)).unwrap();
        assert!(!writer.is_complete(&path));

        let bare = ParquetWriter::new(ParquetOutputConfig {
            write_metadata_sidecar: false,
            ..Default::default()
        });
        assert!(bare.is_complete(&path));
    }

    #[test]
    fn test_unwritable_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing").join("out.parquet");
        let dataset = load(InstrumentKind::Testing, &request(2)).unwrap();

        let writer = ParquetWriter::new(ParquetOutputConfig::default());
        assert!(writer.write_dataset(&dataset, &path).is_err());
    }
}
