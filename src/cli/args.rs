//! Command-line argument definitions for the test instrument generator
//!
//! This module defines the CLI interface using the clap derive API.

use crate::config::CompressionAlgorithm;
use crate::constants::test_date;
use crate::error::{InstrumentError, Result};
use crate::models::InstrumentKind;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the synthetic test instrument generator
///
/// Produces deterministic satellite, profile, imager and model datasets for
/// exercising data-loading pipelines, and writes them out as Parquet
/// fixtures.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "testinst",
    version,
    about = "Generate deterministic synthetic instrument data sets",
    long_about = "Generates the pysat test instruments: orbit-like scalar data, altitude \
                  profiles, images and a 4D model field, in tabular or labeled-array layout. \
                  Data sets can be inspected on the command line or written to Parquet fixtures."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// List the available instruments and their tags
    List(ListArgs),
    /// List the fake file names an instrument would load
    Files(FilesArgs),
    /// Generate one data set and describe its variables
    Describe(DescribeArgs),
    /// Generate Parquet fixtures
    Generate(GenerateArgs),
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON format for scripting
    Json,
}

#[derive(Debug, Clone, Parser)]
pub struct ListArgs {
    /// Output format
    #[arg(long = "format", value_enum, default_value = "human")]
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone, Parser)]
pub struct FilesArgs {
    /// First day to list (default: one year before the test date)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub start: Option<NaiveDate>,

    /// Last day to list, inclusive (default: two years after the test date, minus a day)
    #[arg(long, value_name = "YYYY-MM-DD", requires = "start")]
    pub stop: Option<NaiveDate>,

    /// Directory to prefix the file names with
    #[arg(long = "data-path", value_name = "PATH")]
    pub data_path: Option<PathBuf>,

    /// Shift every file timestamp five minutes past midnight
    #[arg(long = "mangle-file-dates")]
    pub mangle_file_dates: bool,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "human")]
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone, Parser)]
pub struct DescribeArgs {
    /// Instrument name, with or without the `pysat_` prefix
    #[arg(value_name = "INSTRUMENT")]
    pub instrument: InstrumentKind,

    /// Variant tag
    #[arg(short, long, default_value = "")]
    pub tag: String,

    /// Day to generate (default: the test date)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub date: Option<NaiveDate>,

    /// Samples per day (default: the instrument default)
    #[arg(short = 'n', long = "num-samples", value_name = "COUNT")]
    pub num_samples: Option<usize>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "human")]
    pub output_format: OutputFormat,
}

impl DescribeArgs {
    pub fn date(&self) -> NaiveDate {
        self.date.unwrap_or_else(test_date)
    }
}

#[derive(Debug, Clone, Parser)]
pub struct GenerateArgs {
    /// Output directory for the Parquet fixtures
    #[arg(
        short = 'o',
        long = "output",
        value_name = "PATH",
        default_value = "fixtures"
    )]
    pub output_dir: PathBuf,

    /// Instruments to generate (default: all)
    #[arg(
        short = 'i',
        long = "instrument",
        value_name = "NAME",
        value_delimiter = ','
    )]
    pub instruments: Vec<InstrumentKind>,

    /// First day to generate (default: the test date)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub start: Option<NaiveDate>,

    /// Day after the last day to generate (default: the day after start)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub end: Option<NaiveDate>,

    /// Generate every supported tag of each instrument
    #[arg(long = "all-tags")]
    pub all_tags: bool,

    /// Write one file per day instead of one per range
    #[arg(long = "per-day")]
    pub per_day: bool,

    /// Samples per day (default: each instrument's default)
    #[arg(short = 'n', long = "num-samples", value_name = "COUNT")]
    pub num_samples: Option<usize>,

    /// Offset of the first sample after midnight, in seconds
    #[arg(long = "start-time", value_name = "SECONDS")]
    pub start_time_seconds: Option<i64>,

    /// Produce non-monotonic, non-unique time indexes
    #[arg(long = "malformed-index")]
    pub malformed_index: bool,

    /// Parquet compression algorithm (default: snappy)
    #[arg(long, value_enum)]
    pub compression: Option<CompressionAlgorithm>,

    /// Number of concurrent generations (default: physical cores)
    #[arg(short = 'j', long = "workers", value_name = "COUNT")]
    pub workers: Option<usize>,

    /// Path to a JSON configuration file
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(long = "force")]
    pub force_overwrite: bool,

    /// Disable the progress bar
    #[arg(long = "no-progress")]
    pub no_progress: bool,
}

impl GenerateArgs {
    /// Instruments to generate, all of them when none were named
    pub fn instruments(&self) -> Vec<InstrumentKind> {
        if self.instruments.is_empty() {
            InstrumentKind::ALL.to_vec()
        } else {
            self.instruments.clone()
        }
    }

    /// Requested `[start, end)` range
    pub fn date_range(&self) -> Result<(NaiveDate, NaiveDate)> {
        let start = self.start.unwrap_or_else(test_date);
        let end = match self.end {
            Some(end) => end,
            None => start.succ_opt().ok_or_else(|| {
                InstrumentError::invalid_request(format!("no day follows {}", start))
            })?,
        };
        Ok((start, end))
    }

    /// Validate argument combinations
    pub fn validate(&self) -> Result<()> {
        let (start, end) = self.date_range()?;
        if end <= start {
            return Err(InstrumentError::invalid_request(format!(
                "end date {} must be after start date {}",
                end, start
            )));
        }
        if self.workers == Some(0) {
            return Err(InstrumentError::Configuration {
                message: "workers must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

impl Args {
    /// Log level from the verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Whether to show progress bars
    pub fn show_progress(&self) -> bool {
        if self.quiet {
            return false;
        }
        match &self.command {
            Some(Commands::Generate(generate)) => !generate.no_progress,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_log_levels() {
        assert_eq!(parse(&["testinst", "list"]).get_log_level(), "warn");
        assert_eq!(parse(&["testinst", "list", "-vv"]).get_log_level(), "debug");
        assert_eq!(parse(&["testinst", "-q", "list"]).get_log_level(), "error");
        assert!(Args::try_parse_from(["testinst", "-q", "-v", "list"]).is_err());
    }

    #[test]
    fn test_generate_arguments() {
        let args = parse(&[
            "testinst",
            "generate",
            "-o",
            "/tmp/out",
            "-i",
            "testing,pysat_testmodel",
            "--start",
            "2009-01-01",
            "--end",
            "2009-01-03",
            "--compression",
            "zstd",
            "--all-tags",
            "--no-progress",
        ]);

        let Some(Commands::Generate(generate)) = &args.command else {
            panic!("expected the generate command");
        };
        assert_eq!(
            generate.instruments(),
            vec![InstrumentKind::Testing, InstrumentKind::TestModel]
        );
        assert_eq!(generate.compression, Some(CompressionAlgorithm::Zstd));
        assert!(generate.all_tags);
        assert!(generate.validate().is_ok());
        assert!(!args.show_progress());
    }

    #[test]
    fn test_generate_defaults() {
        let args = parse(&["testinst", "generate"]);
        let Some(Commands::Generate(generate)) = &args.command else {
            panic!("expected the generate command");
        };
        assert_eq!(generate.instruments().len(), 6);
        let (start, end) = generate.date_range().unwrap();
        assert_eq!(start, test_date());
        assert_eq!((end - start).num_days(), 1);
        assert!(generate.compression.is_none());
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(Args::try_parse_from(["testinst", "describe", "pysat_nothing"]).is_err());
        assert!(Args::try_parse_from(["testinst", "generate", "--compression", "brotli"]).is_err());

        let args = parse(&[
            "testinst",
            "generate",
            "--start",
            "2009-01-05",
            "--end",
            "2009-01-01",
        ]);
        let Some(Commands::Generate(generate)) = &args.command else {
            panic!("expected the generate command");
        };
        assert!(generate.validate().is_err());
    }

    #[test]
    fn test_start_on_last_representable_day() {
        let args = parse(&["testinst", "generate"]);
        let Some(Commands::Generate(mut generate)) = args.command else {
            panic!("expected the generate command");
        };
        generate.start = Some(NaiveDate::MAX);
        assert!(generate.date_range().is_err());
        assert!(generate.validate().is_err());
    }

    #[test]
    fn test_files_arguments() {
        let args = parse(&["testinst", "files", "--start", "2009-01-01", "--mangle-file-dates"]);
        let Some(Commands::Files(files)) = &args.command else {
            panic!("expected the files command");
        };
        assert!(files.mangle_file_dates);
        assert!(files.stop.is_none());

        assert!(Args::try_parse_from(["testinst", "files", "--stop", "2009-01-01"]).is_err());
    }

    #[test]
    fn test_describe_arguments() {
        let args = parse(&["testinst", "describe", "ndtesting", "-n", "5", "--format", "json"]);
        let Some(Commands::Describe(describe)) = &args.command else {
            panic!("expected the describe command");
        };
        assert_eq!(describe.instrument, InstrumentKind::NdTesting);
        assert_eq!(describe.num_samples, Some(5));
        assert_eq!(describe.output_format, OutputFormat::Json);
        assert_eq!(describe.date(), test_date());
    }
}
