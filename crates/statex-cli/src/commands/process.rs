//! Process command - extract transactions from a single statement.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use tracing::{debug, info};

use statex_core::{ExtractionReport, StatementPayload};

use super::{load_config, process_statement};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input statement (PDF)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Merchant model file (JSON)
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Use only table-derived transactions
    #[arg(long)]
    no_text_fallback: bool,

    /// Print the extraction report to stderr
    #[arg(long)]
    show_report: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON payload
    Json,
    /// One CSV row per transaction
    Csv,
    /// Plain text listing
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(model) = &args.model {
        config.classifier.model_path = Some(model.clone());
    }
    if args.no_text_fallback {
        config.extraction.text_fallback = false;
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.set_message("Extracting transactions...");

    let input = args.input.clone();
    let (payload, report) =
        tokio::task::spawn_blocking(move || process_statement(&input, &config)).await??;

    pb.finish_and_clear();

    let output = format_payload(&payload, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} {} transactions written to {}",
            style("✓").green(),
            payload.transactions.len(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_report {
        eprintln!();
        eprint!("{}", format_report(&report));
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

pub fn format_payload(payload: &StatementPayload, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(payload)?),
        OutputFormat::Csv => format_csv(payload),
        OutputFormat::Text => Ok(format_text(payload)),
    }
}

fn format_csv(payload: &StatementPayload) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "date",
        "description",
        "translated_description",
        "amount",
        "currency",
        "category",
        "confidence",
    ])?;

    for tx in &payload.transactions {
        wtr.write_record([
            &tx.date.to_string(),
            &tx.description,
            &tx.translated_description,
            &tx.amount.to_string(),
            &payload.metadata.currency,
            tx.category.as_deref().unwrap_or(""),
            &format!("{:.2}", tx.confidence),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(payload: &StatementPayload) -> String {
    let metadata = &payload.metadata;
    let mut output = String::new();

    output.push_str(&format!(
        "Currency: {} ({}, confidence {:.2})\n",
        metadata.currency, metadata.currency_detection_method, metadata.currency_confidence
    ));
    if let Some(source) = &metadata.source {
        output.push_str(&format!("Source: {}\n", source));
    }
    output.push_str(&format!("Transactions: {}\n\n", payload.transactions.len()));

    let mut debits = Decimal::ZERO;
    let mut credits = Decimal::ZERO;
    for tx in &payload.transactions {
        if tx.amount.is_sign_negative() {
            debits += tx.amount;
        } else {
            credits += tx.amount;
        }
        output.push_str(&format!(
            "{}  {:>12}  {:<16}  {}\n",
            tx.date,
            tx.amount,
            tx.category.as_deref().unwrap_or("-"),
            tx.translated_description
        ));
    }

    output.push('\n');
    output.push_str(&format!("Debits:  {} {}\n", debits, metadata.currency));
    output.push_str(&format!("Credits: {} {}\n", credits, metadata.currency));

    output
}

pub fn format_report(report: &ExtractionReport) -> String {
    let mut output = String::new();

    output.push_str(&format!("{} Pages: {}\n", style("ℹ").blue(), report.pages));
    if !report.table_less_pages.is_empty() {
        let pages: Vec<String> = report.table_less_pages.iter().map(|p| p.to_string()).collect();
        output.push_str(&format!("{} Pages without tables: {}\n", style("⚠").yellow(), pages.join(", ")));
    }
    for (i, profile) in report.page_profiles.iter().enumerate() {
        output.push_str(&format!("   page {}: {}\n", i + 1, profile.as_deref().unwrap_or("no rows")));
    }

    let chosen = match report.chosen {
        Some(source) => format!("{:?}", source).to_lowercase(),
        None => "none".to_string(),
    };
    output.push_str(&format!("{} Chosen set: {}\n", style("ℹ").blue(), chosen));
    output.push_str(&format!(
        "   table: {} transactions, badness {:.2}, {} dropped\n",
        report.table_count,
        report.table_score,
        report.table_drops.total()
    ));
    output.push_str(&format!(
        "   text:  {} transactions, badness {:.2}, {} dropped\n",
        report.text_count,
        report.text_score,
        report.text_drops.total()
    ));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use statex_core::{CategorizedTransaction, RawTransaction, StatementMetadata};

    fn payload() -> StatementPayload {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let tx = CategorizedTransaction::new(
            &RawTransaction::new(date, "Wolt, order", Decimal::new(-2550, 2)),
            "Wolt, order".to_string(),
            Some("Food".to_string()),
            0.5,
        );
        StatementPayload {
            transactions: vec![tx],
            metadata: StatementMetadata::default(),
        }
    }

    #[test]
    fn test_csv_quotes_fields() {
        let csv = format_csv(&payload()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("date,description,translated_description,amount,currency,category,confidence")
        );
        assert_eq!(lines.next(), Some("2024-03-01,\"Wolt, order\",\"Wolt, order\",-25.50,GEL,Food,0.50"));
    }

    #[test]
    fn test_text_totals() {
        let text = format_text(&payload());
        assert!(text.contains("Transactions: 1"));
        assert!(text.contains("Debits:  -25.50 GEL"));
        assert!(text.contains("Credits: 0 GEL"));
    }
}
