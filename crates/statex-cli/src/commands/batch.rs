//! Batch processing command for multiple statement files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use statex_core::{CandidateSource, StatementPayload};

use super::process::{OutputFormat, format_payload};
use super::{load_config, process_statement};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct ProcessResult {
    index: usize,
    path: PathBuf,
    payload: Option<StatementPayload>,
    chosen: Option<CandidateSource>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = Arc::new(load_config(config_path)?);

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let semaphore = Arc::new(Semaphore::new(args.jobs.max(1)));
    let mut tasks = JoinSet::new();

    for (index, path) in files.into_iter().enumerate() {
        let semaphore = semaphore.clone();
        let config = config.clone();
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            let file_start = Instant::now();
            let task_path = path.clone();
            let outcome = tokio::task::spawn_blocking(move || process_statement(&task_path, &config))
                .await
                .map_err(anyhow::Error::from)
                .and_then(|r| r);

            let processing_time_ms = file_start.elapsed().as_millis() as u64;
            match outcome {
                Ok((payload, report)) => ProcessResult {
                    index,
                    path,
                    payload: Some(payload),
                    chosen: report.chosen,
                    error: None,
                    processing_time_ms,
                },
                Err(e) => ProcessResult {
                    index,
                    path,
                    payload: None,
                    chosen: None,
                    error: Some(e.to_string()),
                    processing_time_ms,
                },
            }
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let result = joined?;
        if let Some(error_msg) = &result.error {
            if args.continue_on_error {
                warn!("Failed to process {}: {}", result.path.display(), error_msg);
            } else {
                error!("Failed to process {}: {}", result.path.display(), error_msg);
                tasks.abort_all();
                overall_pb.abandon();
                anyhow::bail!("Processing failed: {}", error_msg);
            }
        }
        overall_pb.inc(1);
        results.push(result);
    }

    overall_pb.finish_with_message("Complete");
    results.sort_by_key(|r| r.index);

    let successful: Vec<_> = results.iter().filter(|r| r.payload.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    if let Some(output_dir) = &args.output_dir {
        for result in &successful {
            if let Some(payload) = &result.payload {
                let output_name = result.path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("statement");
                let output_path = output_dir.join(format!("{}.{}", output_name, args.format.extension()));

                fs::write(&output_path, format_payload(payload, args.format)?)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
    }

    if args.summary {
        let summary_path = args.output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    let empty: Vec<_> = successful
        .iter()
        .filter(|r| r.payload.as_ref().is_some_and(|p| p.transactions.is_empty()))
        .collect();
    if !empty.is_empty() {
        println!(
            "   {} with no transactions",
            style(empty.len()).yellow()
        );
    }

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

/// One line of the summary CSV.
#[derive(Serialize)]
struct SummaryRow<'a> {
    filename: &'a str,
    status: &'static str,
    transactions: Option<usize>,
    currency: Option<&'a str>,
    currency_confidence: Option<String>,
    source_set: Option<CandidateSource>,
    total_debits: Option<Decimal>,
    total_credits: Option<Decimal>,
    processing_time_ms: u64,
    error: &'a str,
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    for result in results {
        let filename = result.path.file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        let row = match &result.payload {
            Some(payload) => {
                let (debits, credits) = totals(payload);
                SummaryRow {
                    filename,
                    status: "success",
                    transactions: Some(payload.transactions.len()),
                    currency: Some(&payload.metadata.currency),
                    currency_confidence: Some(format!("{:.2}", payload.metadata.currency_confidence)),
                    source_set: result.chosen,
                    total_debits: Some(debits),
                    total_credits: Some(credits),
                    processing_time_ms: result.processing_time_ms,
                    error: "",
                }
            }
            None => SummaryRow {
                filename,
                status: "error",
                transactions: None,
                currency: None,
                currency_confidence: None,
                source_set: None,
                total_debits: None,
                total_credits: None,
                processing_time_ms: result.processing_time_ms,
                error: result.error.as_deref().unwrap_or(""),
            },
        };
        wtr.serialize(row)?;
    }

    wtr.flush()?;
    Ok(())
}

/// (sum of debits, sum of credits)
fn totals(payload: &StatementPayload) -> (Decimal, Decimal) {
    payload.transactions.iter().fold((Decimal::ZERO, Decimal::ZERO), |(debits, credits), tx| {
        if tx.amount.is_sign_negative() {
            (debits + tx.amount, credits)
        } else {
            (debits, credits + tx.amount)
        }
    })
}
