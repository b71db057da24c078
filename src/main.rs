use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use sentiment_triage::config::Resources;
use sentiment_triage::io::report::{ReportFormat, ReportOptions, write_report};
use sentiment_triage::io::{merger, records};
use sentiment_triage::models::PriorityLevel;
use sentiment_triage::pipeline::Pipeline;
use tracing::info;

/// Sentiment triage for social-media interaction exports
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score an input table and write the triage report
    Score {
        /// Input CSV of records
        #[arg(short, long, default_value = "data/raw/raw_fb_data.csv")]
        input: PathBuf,

        /// Report path
        #[arg(short, long, default_value = "data/output/scored_feedback.csv")]
        output: PathBuf,

        /// Directory holding config.yaml and dictionaries/
        #[arg(short, long, default_value = "resources")]
        resources: PathBuf,

        #[arg(long, value_enum, default_value_t = ReportFormat::Csv)]
        format: ReportFormat,

        /// Show the post text instead of the placeholder on reaction-only rows
        #[arg(long)]
        expand_reactions: bool,

        /// Hide the progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Merge crawler exports (posts, comments, reactions) into an input table
    Merge {
        #[arg(long, default_value = "data/crawler")]
        crawler_dir: PathBuf,

        #[arg(short, long, default_value = "data/raw/raw_fb_data.csv")]
        output: PathBuf,

        #[arg(short, long, default_value = "resources")]
        resources: PathBuf,
    },

    /// Concatenate every CSV in a directory into one input table
    Ingest {
        #[arg(long, default_value = "data/raw")]
        raw_dir: PathBuf,

        #[arg(short, long, default_value = "data/processed/merged_raw.csv")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Score {
            input,
            output,
            resources,
            format,
            expand_reactions,
            quiet,
        } => {
            let options = ReportOptions {
                format,
                expand_reactions,
            };
            score(&input, &output, &resources, options, quiet)
        }
        Command::Merge {
            crawler_dir,
            output,
            resources,
        } => {
            let res = Resources::load(&resources)?;
            let outcome = merger::merge_exports(&crawler_dir, &res.dictionaries)
                .with_context(|| format!("failed to merge exports in {}", crawler_dir.display()))?;
            records::write_records(&output, &outcome.records)?;
            Ok(())
        }
        Command::Ingest { raw_dir, output } => {
            let merged = records::ingest_dir(&raw_dir)
                .with_context(|| format!("failed to ingest {}", raw_dir.display()))?;
            records::write_records(&output, &merged.records)?;
            Ok(())
        }
    }
}

fn score(
    input: &Path,
    output: &Path,
    resources: &Path,
    options: ReportOptions,
    quiet: bool,
) -> Result<()> {
    // 1. Mandatory input checked before anything loads
    if !input.is_file() {
        anyhow::bail!("input file not found: {}", input.display());
    }

    // 2. Resources
    let res = Resources::load(resources)?;

    // 3. Records
    let loaded = records::read_records(input)
        .with_context(|| format!("failed to read {}", input.display()))?;

    // 4. Pipeline
    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(loaded.records.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  {bar:40.cyan/blue} {pos}/{len} records {msg}")
                .expect("valid template")
                .progress_chars("█▓░"),
        );
        pb
    };
    let pipeline = Pipeline::new(&res);
    let mut report = pipeline.run_with_progress(&loaded.records, &progress);
    report.skipped = loaded.skipped;

    // 5. Report
    write_report(output, &report.segments, options)
        .with_context(|| format!("failed to write report {}", output.display()))?;

    for level in PriorityLevel::ALL {
        info!("{level}: {}", report.count(level));
    }
    info!(
        "Done: {} records, {} skipped, {} segments -> {}",
        report.records,
        report.skipped,
        report.segments.len(),
        output.display()
    );
    Ok(())
}
