//! Command-line front end for the invoice stamping batch.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use invoicestamp_infra::{AppConfig, BatchReport, BatchRunner, DatasetStore, FailurePolicy};
use invoicestamp_invoicing::CrossReferenceTable;

#[derive(Parser, Debug, Clone)]
#[command(name = "invoicestamp")]
#[command(about = "Stamp invoice and backup data onto PDF templates")]
#[command(version)]
pub struct Cli {
    /// Config file (default: $INVOICESTAMP_CONFIG, then ./config.json).
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Invoice workbook (xlsx, xls or ods).
    #[arg(long, value_name = "FILE")]
    pub invoices: PathBuf,

    /// Backup workbook (xlsx, xls or ods).
    #[arg(long, value_name = "FILE")]
    pub backups: PathBuf,

    /// What to do when an invoice fails: abort or skip.
    #[arg(long = "on-error", value_name = "POLICY", value_parser = parse_policy)]
    pub on_error: Option<FailurePolicy>,

    /// Backup rows per page.
    #[arg(long = "rows-per-page", value_parser = clap::value_parser!(u32).range(1..))]
    pub rows_per_page: Option<u32>,
}

fn parse_policy(s: &str) -> Result<FailurePolicy, String> {
    s.parse::<FailurePolicy>().map_err(|e| e.to_string())
}

/// Load configuration and datasets, then run the batch.
pub fn run(cli: &Cli) -> anyhow::Result<BatchReport> {
    let config_path = AppConfig::locate(cli.config.as_deref());
    let mut config = AppConfig::load(&config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;
    if let Some(policy) = cli.on_error {
        config.failure_policy = policy;
    }
    if let Some(rows) = cli.rows_per_page {
        config.rows_per_page = rows as usize;
    }

    let mut datasets = DatasetStore::new();
    datasets
        .load_invoices(&cli.invoices)
        .with_context(|| format!("loading invoices from {}", cli.invoices.display()))?;
    datasets
        .load_backups(&cli.backups)
        .with_context(|| format!("loading backups from {}", cli.backups.display()))?;

    let runner = BatchRunner::from_config(&config).context("preparing templates and layout")?;
    let report = runner.run(&datasets, CrossReferenceTable::new())?;
    Ok(report)
}

/// Human-readable end-of-batch summary.
pub fn summary(report: &BatchReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "documents written: {}", report.documents_written());
    for doc in &report.documents {
        let _ = writeln!(
            out,
            "  {} -> {} ({} pages)",
            doc.invoice_number,
            doc.path.display(),
            doc.page_count
        );
    }
    if !report.failures.is_empty() {
        let _ = writeln!(out, "failures: {}", report.failures.len());
        for failure in &report.failures {
            let _ = writeln!(
                out,
                "  {} while {}: {}",
                failure.invoice_number, failure.state, failure.cause
            );
        }
    }
    let _ = write!(
        out,
        "cross-reference rows: {} -> {}",
        report.cross_reference.len(),
        report.export_path.display()
    );
    out
}
