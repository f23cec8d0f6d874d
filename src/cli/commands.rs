//! Command implementations for the test instrument CLI
//!
//! This module contains the command execution logic, report output and
//! logging setup for the CLI interface.

use crate::cli::args::{
    Args, Commands, DescribeArgs, FilesArgs, GenerateArgs, ListArgs, OutputFormat,
};
use crate::config::{GeneratorConfig, SystemProfile};
use crate::dataset::Dataset;
use crate::instruments;
use crate::models::{InstrumentKind, LoadRequest, ProcessingStats};
use crate::processor::{FixtureProcessor, plan_jobs, print_summary};
use crate::times::list_files;
use anyhow::{Context, Result};
use colored::*;
use tracing::{debug, info};

/// Main command runner
pub async fn run(args: Args) -> Result<ProcessingStats> {
    setup_logging(&args)?;
    debug!("Command line arguments: {:?}", args);

    match &args.command {
        Some(Commands::List(list)) => run_list(list).map(|_| ProcessingStats::default()),
        Some(Commands::Files(files)) => run_files(files).map(|_| ProcessingStats::default()),
        Some(Commands::Describe(describe)) => {
            run_describe(describe).map(|_| ProcessingStats::default())
        }
        Some(Commands::Generate(generate)) => run_generate(&args, generate).await,
        None => Ok(ProcessingStats::default()),
    }
}

/// Set up structured logging based on CLI arguments
pub fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("test_instruments={}", log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr),
        )
        .try_init()
        .context("Failed to initialise logging")?;

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

fn run_list(args: &ListArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Json => {
            let instruments: Vec<_> = InstrumentKind::ALL
                .iter()
                .map(|kind| {
                    serde_json::json!({
                        "name": kind.full_name(),
                        "container": kind.container(),
                        "frequency_seconds": kind.frequency_seconds(),
                        "default_num_samples": kind.default_num_samples(),
                        "tags": kind.tags().iter().map(|(tag, desc)| {
                            serde_json::json!({ "tag": tag, "description": desc })
                        }).collect::<Vec<_>>(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&instruments)?);
        }
        OutputFormat::Human => {
            println!("{}", "Available test instruments:".bright_green().bold());
            for kind in InstrumentKind::ALL {
                println!(
                    "\n  {} {}",
                    kind.full_name().bright_cyan().bold(),
                    format!(
                        "({:?}, {} s, {} samples/day)",
                        kind.container(),
                        kind.frequency_seconds(),
                        kind.default_num_samples()
                    )
                    .bright_black()
                );
                for (tag, desc) in kind.tags() {
                    let tag = if tag.is_empty() { "''" } else { *tag };
                    println!("    {:<12} {}", tag.bright_yellow(), desc);
                }
            }
        }
    }
    Ok(())
}

fn run_files(args: &FilesArgs) -> Result<()> {
    let range = args
        .start
        .map(|start| (start, args.stop.unwrap_or(start)));
    let files = list_files(range, args.data_path.as_deref(), args.mangle_file_dates);
    info!("Listed {} fake files", files.len());

    match args.output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&files)?),
        OutputFormat::Human => {
            for entry in &files {
                println!("{}  {}", entry.timestamp, entry.name);
            }
        }
    }
    Ok(())
}

fn run_describe(args: &DescribeArgs) -> Result<()> {
    let mut request = LoadRequest::for_date(args.date()).with_tag(args.tag.clone());
    if let Some(num) = args.num_samples {
        request = request.with_num_samples(num);
    }

    let dataset = instruments::load(args.instrument, &request)
        .with_context(|| format!("Failed to generate {}", args.instrument))?;

    match args.output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&dataset.meta)?),
        OutputFormat::Human => print_description(&dataset),
    }
    Ok(())
}

fn print_description(dataset: &Dataset) {
    println!(
        "{} {}",
        dataset.kind.full_name().bright_green().bold(),
        format!("({:?}, {} samples)", dataset.format(), dataset.len()).bright_black()
    );
    if let (Some(first), Some(last)) = (dataset.index.first(), dataset.index.last()) {
        println!("  {} {} to {}", "Time:".bright_cyan(), first, last);
    }

    println!();
    println!(
        "  {:<26} {:<10} {:<40} {}",
        "variable".bold(),
        "units".bold(),
        "dims".bold(),
        "description".bold()
    );
    for (name, meta) in dataset.meta.iter() {
        let dims = meta
            .dims
            .iter()
            .zip(&meta.shape)
            .map(|(dim, len)| format!("{}={}", dim, len))
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "  {:<26} {:<10} {:<40} {}",
            name.bright_cyan(),
            meta.units,
            dims,
            meta.desc
        );
    }
}

async fn run_generate(args: &Args, generate: &GenerateArgs) -> Result<ProcessingStats> {
    generate.validate()?;

    let profile = SystemProfile::detect();
    debug!(
        "System profile: {} cores ({} physical), {} MB",
        profile.cpu_cores, profile.performance_cores, profile.memory_mb
    );

    let mut config = match &generate.config_file {
        Some(path) => GeneratorConfig::from_json_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => GeneratorConfig::for_system(&profile),
    };
    apply_cli_overrides(&mut config, args, generate);
    config.validate()?;

    let (start, end) = generate.date_range()?;
    let jobs = plan_jobs(
        &generate.instruments(),
        start,
        end,
        generate.all_tags,
        generate.per_day,
    )?;

    if !args.quiet {
        println!(
            "{}",
            "Starting fixture generation".bright_green().bold()
        );
        println!(
            "  {} {}",
            "Output:".bright_cyan(),
            generate.output_dir.display()
        );
        println!(
            "  {} {} files from {} to {}",
            "Planned:".bright_cyan(),
            jobs.len().to_string().bright_white().bold(),
            start,
            end
        );
    }

    let processor = FixtureProcessor::new(generate.output_dir.clone(), config)?;
    let stats = processor.process(jobs).await?;

    if !args.quiet {
        print_summary(&stats);
    }
    if stats.files_failed > 0 {
        anyhow::bail!("{} of the fixtures failed to generate", stats.files_failed);
    }
    Ok(stats)
}

/// Apply command line settings on top of the configuration
fn apply_cli_overrides(config: &mut GeneratorConfig, args: &Args, generate: &GenerateArgs) {
    if let Some(workers) = generate.workers {
        config.max_concurrent_files = workers;
    }
    if let Some(num) = generate.num_samples {
        config.num_samples = Some(num);
    }
    if let Some(seconds) = generate.start_time_seconds {
        config.start_time_seconds = Some(seconds);
    }
    if generate.malformed_index {
        config.malformed_index = true;
    }
    if generate.force_overwrite {
        config.force_overwrite = true;
    }
    if let Some(compression) = generate.compression {
        config.parquet.compression_algorithm = compression;
    }
    config.show_progress = args.show_progress();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompressionAlgorithm;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn test_apply_cli_overrides() {
        let args = Args::try_parse_from([
            "testinst",
            "generate",
            "-j",
            "3",
            "-n",
            "50",
            "--compression",
            "lz4",
            "--force",
            "--no-progress",
        ])
        .unwrap();
        let Some(Commands::Generate(generate)) = &args.command else {
            panic!("expected the generate command");
        };

        let mut config = GeneratorConfig::default();
        apply_cli_overrides(&mut config, &args, generate);

        assert_eq!(config.max_concurrent_files, 3);
        assert_eq!(config.num_samples, Some(50));
        assert_eq!(config.parquet.compression_algorithm, CompressionAlgorithm::Lz4);
        assert!(config.force_overwrite);
        assert!(!config.show_progress);
    }

    #[tokio::test]
    async fn test_generate_command() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("fixtures");
        let args = Args::try_parse_from([
            "testinst",
            "-q",
            "generate",
            "-o",
            output.to_str().unwrap(),
            "-i",
            "testing,testing2d_xarray",
            "-n",
            "20",
        ])
        .unwrap();
        let Some(Commands::Generate(generate)) = &args.command else {
            panic!("expected the generate command");
        };

        let stats = run_generate(&args, generate).await.unwrap();
        assert_eq!(stats.files_generated, 2);
        assert_eq!(stats.total_samples, 40);
        assert!(output.join("pysat_testing_2009-01-01.parquet").exists());
    }

    #[test]
    fn test_files_command() {
        let args = Args::try_parse_from([
            "testinst",
            "files",
            "--start",
            "2009-01-01",
            "--stop",
            "2009-01-03",
            "--mangle-file-dates",
            "--format",
            "json",
        ])
        .unwrap();
        let Some(Commands::Files(files)) = &args.command else {
            panic!("expected the files command");
        };
        assert!(run_files(files).is_ok());
    }

    #[test]
    fn test_describe_unknown_tag() {
        let args =
            Args::try_parse_from(["testinst", "describe", "testmodel", "-t", "fives"]).unwrap();
        let Some(Commands::Describe(describe)) = &args.command else {
            panic!("expected the describe command");
        };
        assert!(run_describe(describe).is_err());
    }
}
