//! Batch fixture generation.
//!
//! Runs many instrument loads concurrently and writes each dataset to its
//! own Parquet file. Generation is CPU bound, so every job runs on the
//! blocking pool; the async side only bounds concurrency and reports
//! progress.

pub mod writer;

use self::writer::ParquetWriter;

use crate::config::GeneratorConfig;
use crate::error::{InstrumentError, Result};
use crate::instruments;
use crate::models::{InstrumentKind, LoadRequest, ProcessingStats};

use chrono::NaiveDate;
use colored::*;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use sysinfo::System;
use tokio::sync::Mutex;
use tokio::task;
use tracing::{debug, error, warn};

/// One dataset to generate and write
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationJob {
    pub kind: InstrumentKind,
    pub request: LoadRequest,
}

impl GenerationJob {
    pub fn new(kind: InstrumentKind, request: LoadRequest) -> Self {
        Self { kind, request }
    }

    /// Output file name, e.g. `pysat_testing_fives_2009-01-01.parquet`
    pub fn file_name(&self) -> String {
        let mut stem = self.kind.full_name();
        if !self.request.tag.is_empty() {
            stem.push('_');
            stem.push_str(&self.request.tag);
        }
        match self.request.end {
            Some(end) if (end - self.request.start).num_days() > 1 => {
                format!("{}_{}_{}.parquet", stem, self.request.start, end)
            }
            _ => format!("{}_{}.parquet", stem, self.request.start),
        }
    }
}

/// Build the jobs for a set of instruments over `[start, end)`.
///
/// With `all_tags` every supported tag of each instrument gets a job;
/// with `per_day` each day is written to its own file.
pub fn plan_jobs(
    kinds: &[InstrumentKind],
    start: NaiveDate,
    end: NaiveDate,
    all_tags: bool,
    per_day: bool,
) -> Result<Vec<GenerationJob>> {
    let range = LoadRequest::for_range(start, end);
    let days = range.days()?;

    let mut jobs = Vec::new();
    for kind in kinds {
        let tags: Vec<&str> = if all_tags {
            kind.tags().iter().map(|(tag, _)| *tag).collect()
        } else {
            vec![""]
        };

        for tag in tags {
            if per_day {
                for day in &days {
                    jobs.push(GenerationJob::new(
                        *kind,
                        LoadRequest::for_date(*day).with_tag(tag),
                    ));
                }
            } else {
                jobs.push(GenerationJob::new(*kind, range.clone().with_tag(tag)));
            }
        }
    }

    debug!("Planned {} generation jobs", jobs.len());
    Ok(jobs)
}

enum JobOutcome {
    Written { name: String, samples: usize, size: u64 },
    Skipped,
}

/// Concurrent generator of Parquet fixtures
#[derive(Debug)]
pub struct FixtureProcessor {
    output_dir: PathBuf,
    config: GeneratorConfig,
    writer: ParquetWriter,
    system_monitor: Arc<Mutex<System>>,
}

impl FixtureProcessor {
    /// Create a processor writing into `output_dir`
    pub fn new(output_dir: PathBuf, config: GeneratorConfig) -> Result<Self> {
        config.validate()?;
        let writer = ParquetWriter::new(config.parquet.clone());
        Ok(Self {
            output_dir,
            config,
            writer,
            system_monitor: Arc::new(Mutex::new(System::new())),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Check if system is under memory pressure
    pub async fn check_memory_pressure(&self) -> bool {
        let mut system = self.system_monitor.lock().await;
        system.refresh_memory();

        let used_memory = system.used_memory() as f64;
        let total_memory = system.total_memory() as f64;

        if total_memory == 0.0 {
            return false;
        }

        let memory_usage = used_memory / total_memory;
        let is_pressure = memory_usage > self.config.memory_pressure_threshold;

        if is_pressure {
            debug!(
                "Memory pressure detected: {:.1}% usage (threshold: {:.1}%)",
                memory_usage * 100.0,
                self.config.memory_pressure_threshold * 100.0
            );
        }

        is_pressure
    }

    /// Generate and write every job, continuing past individual failures
    pub async fn process(&self, jobs: Vec<GenerationJob>) -> Result<ProcessingStats> {
        let start_time = Instant::now();
        tokio::fs::create_dir_all(&self.output_dir).await?;

        if jobs.is_empty() {
            return Ok(ProcessingStats {
                output_dir: self.output_dir.clone(),
                processing_time_ms: start_time.elapsed().as_millis(),
                ..Default::default()
            });
        }

        let pb = if self.config.show_progress {
            let pb = ProgressBar::new(jobs.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] \
                         {pos}/{len} ({eta}) {msg}",
                    )
                    .map_err(|e| InstrumentError::Configuration {
                        message: format!("Invalid progress template: {}", e),
                    })?
                    .progress_chars("#>-"),
            );
            pb
        } else {
            ProgressBar::hidden()
        };
        pb.set_message("Generating fixtures");

        let mut concurrent_limit = self.config.max_concurrent_files.min(jobs.len()).max(1);
        if self.check_memory_pressure().await {
            concurrent_limit = (concurrent_limit / 2).max(1);
            debug!(
                "Memory pressure detected, reducing concurrency to {}",
                concurrent_limit
            );
        }

        let mut stats = stream::iter(jobs)
            .map(|job| {
                let pb = pb.clone();
                async move {
                    pb.set_message(format!("Generating: {}", job.file_name()));
                    let result = self.run_job(job.clone()).await;
                    pb.inc(1);

                    if let Err(e) = &result {
                        error!("Failed to generate {}: {:#}", job.file_name(), e);
                    }
                    result
                }
            })
            .buffer_unordered(concurrent_limit)
            .fold(
                ProcessingStats {
                    output_dir: self.output_dir.clone(),
                    ..Default::default()
                },
                |mut stats, result| async move {
                    match result {
                        Ok(JobOutcome::Written { name, samples, size }) => {
                            stats.files_generated += 1;
                            stats.total_samples += samples;
                            stats.output_sizes.push((name, size));
                        }
                        Ok(JobOutcome::Skipped) => stats.files_skipped += 1,
                        Err(_) => stats.files_failed += 1,
                    }
                    stats
                },
            )
            .await;

        pb.finish_with_message("All fixtures generated");

        if self.check_memory_pressure().await {
            warn!("Memory pressure remained high during generation");
        }

        stats.output_sizes.sort();
        stats.processing_time_ms = start_time.elapsed().as_millis();
        Ok(stats)
    }

    async fn run_job(&self, job: GenerationJob) -> Result<JobOutcome> {
        let name = job.file_name();
        let path = self.output_dir.join(&name);

        if !self.config.force_overwrite && self.writer.is_complete(&path) {
            warn!("Skipping existing file: {}", path.display());
            return Ok(JobOutcome::Skipped);
        }

        let request = self.config.apply_to(job.request);
        let writer = self.writer.clone();
        let kind = job.kind;
        let task_path = path.clone();

        let (samples, size) = task::spawn_blocking(move || -> Result<(usize, u64)> {
            let dataset = instruments::load(kind, &request)?;
            let size = writer.write_dataset(&dataset, &task_path)?;
            Ok((dataset.len(), size))
        })
        .await
        .map_err(|e| InstrumentError::ProcessingFailed {
            path: path.clone(),
            reason: format!("Generation task failed: {}", e),
        })??;

        debug!("Generated {} ({} samples)", path.display(), samples);
        Ok(JobOutcome::Written {
            name,
            samples,
            size,
        })
    }
}

/// Print a coloured summary of a batch run
pub fn print_summary(stats: &ProcessingStats) {
    println!("\n{}", "Generation Summary".bright_green().bold());
    println!(
        "  {} {}ms",
        "Time elapsed:".bright_cyan(),
        stats.processing_time_ms.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Output directory:".bright_cyan(),
        stats.output_dir.display()
    );
    println!(
        "  {} {}",
        "Files generated:".bright_cyan(),
        stats.files_generated.to_string().bright_white()
    );
    if stats.files_skipped > 0 {
        println!(
            "  {} {}",
            "Files skipped:".bright_yellow(),
            stats.files_skipped.to_string().bright_yellow()
        );
    }
    if stats.files_failed > 0 {
        println!(
            "  {} {}",
            "Files failed:".bright_red(),
            stats.files_failed.to_string().bright_red().bold()
        );
    }
    println!(
        "  {} {}",
        "Total samples:".bright_cyan(),
        stats.total_samples.to_string().bright_white().bold()
    );
    println!(
        "  {} {}",
        "Total size:".bright_cyan(),
        ProcessingStats::format_size(stats.total_output_size()).bright_white()
    );
}
