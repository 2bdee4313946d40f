//! CDR Reconciliation CLI
//!
//! Runs a single reconciliation job over two CDR exports and prints the
//! summary, optionally writing the sampled discrepancies as a CSV report.
//! Mapping files are validated here at the boundary; file size, extension,
//! and row limits are enforced by the engine's own defensive checks.

use anyhow::{bail, Context};
use clap::Parser;
use recon_core::models::{ColumnMapping, Discrepancy, DiscrepancyType, JobInput, JobOutput};
use recon_core::EngineConfig;
use recon_engine::reconcile;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Reconcile two CDR exports and report the discrepancies
#[derive(Debug, Parser)]
#[command(name = "cdr-recon", version)]
struct Cli {
    /// Your switch export (side A)
    file_a: PathBuf,

    /// The provider export (side B)
    file_b: PathBuf,

    /// JSON column mapping for side A (canonical field -> column header)
    #[arg(long)]
    mapping_a: PathBuf,

    /// JSON column mapping for side B
    #[arg(long)]
    mapping_b: PathBuf,

    /// Write the discrepancy report to this CSV file
    #[arg(long)]
    export: Option<PathBuf>,

    /// Print the full result as JSON instead of the human summary
    #[arg(long)]
    json: bool,
}

/// Initialize tracing/logging
fn init_tracing() {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "cdr_recon={},recon_engine={},recon_store={},recon_ingest={},sqlx=warn",
            log_level, log_level, log_level, log_level
        ))
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .init();
}

fn load_mapping(path: &Path) -> anyhow::Result<ColumnMapping> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read mapping {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("mapping {} is not valid JSON", path.display()))?;
    let mapping = ColumnMapping::from_json_value(&value)?;
    mapping.validate()?;
    Ok(mapping)
}

fn declared_name(path: &Path) -> anyhow::Result<String> {
    match path.file_name() {
        Some(name) => Ok(name.to_string_lossy().into_owned()),
        None => bail!("{} has no file name", path.display()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let config = EngineConfig::load().context("failed to load configuration")?;

    let input = JobInput {
        file_a_declared_name: declared_name(&cli.file_a)?,
        file_a_path: cli.file_a.clone(),
        file_b_declared_name: declared_name(&cli.file_b)?,
        file_b_path: cli.file_b.clone(),
        mapping_a: load_mapping(&cli.mapping_a)?,
        mapping_b: load_mapping(&cli.mapping_b)?,
    };

    let output = match reconcile(&input, &config).await {
        Ok(output) => output,
        Err(e) => {
            eprintln!("error ({}): {}", e.error_code(), e);
            std::process::exit(1);
        }
    };

    if let Some(export_path) = &cli.export {
        export_csv(&output, export_path)?;
        info!("Wrote discrepancy report to {}", export_path.display());
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_summary(&output);
    }

    Ok(())
}

fn print_summary(output: &JobOutput) {
    let s = &output.summary;
    println!("Reconciliation job {}", output.job_id);
    println!();
    println!(
        "Records:       {} yours / {} provider, {} matched",
        s.total_records_a, s.total_records_b, s.matched_records
    );
    println!(
        "Billed:        ${} yours / ${} provider (difference ${})",
        s.your_total_billed, s.provider_total_billed, s.billing_difference
    );
    println!(
        "Minutes:       {} yours / {} provider (difference {})",
        s.your_total_minutes, s.provider_total_minutes, s.minutes_difference
    );
    println!(
        "Unmatched:     {} yours ({} zero-duration) / {} provider ({} zero-duration)",
        s.missing_in_yours,
        s.zero_duration_in_yours,
        s.missing_in_provider,
        s.zero_duration_in_provider
    );
    println!(
        "Mismatches:    {} duration, {} rate, {} cost, {} LRN",
        s.duration_mismatches, s.rate_mismatches, s.cost_mismatches, s.lrn_mismatches
    );
    if s.hung_calls_yours + s.hung_calls_provider > 0 {
        println!(
            "Hung calls:    {} yours in {} groups / {} provider in {} groups",
            s.hung_calls_yours,
            s.hung_call_groups_yours,
            s.hung_calls_provider,
            s.hung_call_groups_provider
        );
    }
    println!(
        "Discrepancies: {} total, monetary impact ${}",
        s.total_discrepancies, s.monetary_impact
    );
    for (kind, impact) in &s.impact_breakdown {
        println!("    {:<24} ${}", kind, impact);
    }
    if output.has_more {
        println!(
            "(showing {} of {} discrepancies; use --export for the full sample)",
            output.discrepancies.len(),
            output.total_discrepancy_count
        );
    }
}

/// Spreadsheet row number for a 0-based data-row index (header + 1-based)
fn spreadsheet_row(raw_index: i64) -> i64 {
    raw_index + 2
}

/// Which export each side's source row lands in
fn source_rows(d: &Discrepancy) -> (Option<i64>, Option<i64>) {
    if d.source_index_a.is_some() || d.source_index_b.is_some() {
        return (d.source_index_a, d.source_index_b);
    }
    match d.kind {
        DiscrepancyType::MissingInB
        | DiscrepancyType::ZeroDurationInB
        | DiscrepancyType::HungCallYours => (d.source_index, None),
        _ => (None, d.source_index),
    }
}

fn optional_row(index: Option<i64>) -> String {
    index.map(|i| spreadsheet_row(i).to_string()).unwrap_or_default()
}

fn optional_string<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

fn iso_seize(seize_time: Option<i64>) -> String {
    seize_time
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default()
}

fn export_csv(output: &JobOutput, path: &Path) -> anyhow::Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let s = &output.summary;

    // Preface: totals, counts, breakdown.
    let preface = [
        ("Your Total Billed", s.your_total_billed.to_string()),
        ("Provider Total Billed", s.provider_total_billed.to_string()),
        ("Billing Difference", s.billing_difference.to_string()),
        ("Your Total Minutes", s.your_total_minutes.to_string()),
        ("Provider Total Minutes", s.provider_total_minutes.to_string()),
        ("Total Records (Yours)", s.total_records_a.to_string()),
        ("Total Records (Provider)", s.total_records_b.to_string()),
        ("Matched Records", s.matched_records.to_string()),
        ("Missing in Yours", s.missing_in_yours.to_string()),
        ("Missing in Provider", s.missing_in_provider.to_string()),
        ("Duration Mismatches", s.duration_mismatches.to_string()),
        ("Rate Mismatches", s.rate_mismatches.to_string()),
        ("Cost Mismatches", s.cost_mismatches.to_string()),
        ("LRN Mismatches", s.lrn_mismatches.to_string()),
        ("Total Discrepancies", s.total_discrepancies.to_string()),
        ("Monetary Impact", s.monetary_impact.to_string()),
    ];
    for (label, value) in preface {
        writer.write_record([label.to_string(), value])?;
    }
    for (kind, impact) in &s.impact_breakdown {
        writer.write_record([format!("Impact: {}", kind), impact.to_string()])?;
    }

    // Blank separator, then the discrepancy table.
    writer.write_record([""])?;
    writer.write_record([
        "Type",
        "A-Number",
        "B-Number",
        "Seize Time (ISO-8601)",
        "Your Duration (s)",
        "Provider Duration (s)",
        "Your Rate",
        "Provider Rate",
        "Your Cost",
        "Provider Cost",
        "Difference ($)",
        "Your LRN",
        "Provider LRN",
        "Your Source Row",
        "Provider Source Row",
    ])?;

    for d in &output.discrepancies {
        let (your_row, provider_row) = source_rows(d);
        writer.write_record([
            d.kind.as_str().to_string(),
            d.a_number.clone(),
            d.b_number.clone(),
            iso_seize(d.seize_time),
            optional_string(&d.your_duration),
            optional_string(&d.provider_duration),
            optional_string(&d.your_rate),
            optional_string(&d.provider_rate),
            optional_string(&d.your_cost),
            optional_string(&d.provider_cost),
            d.cost_difference.to_string(),
            optional_string(&d.your_lrn),
            optional_string(&d.provider_lrn),
            optional_row(your_row),
            optional_row(provider_row),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spreadsheet_row_alignment() {
        // Data row 0 sits on spreadsheet row 2: one header row, 1-based.
        assert_eq!(spreadsheet_row(0), 2);
        assert_eq!(spreadsheet_row(41), 43);
    }

    #[test]
    fn test_source_rows_side_assignment() {
        let mut one_sided = Discrepancy::new(DiscrepancyType::MissingInB);
        one_sided.source_index = Some(3);
        assert_eq!(source_rows(&one_sided), (Some(3), None));

        let mut provider_side = Discrepancy::new(DiscrepancyType::MissingInA);
        provider_side.source_index = Some(4);
        assert_eq!(source_rows(&provider_side), (None, Some(4)));

        let mut matched = Discrepancy::new(DiscrepancyType::RateMismatch);
        matched.source_index_a = Some(1);
        matched.source_index_b = Some(2);
        assert_eq!(source_rows(&matched), (Some(1), Some(2)));
    }

    #[test]
    fn test_iso_seize() {
        assert_eq!(iso_seize(Some(1_705_314_600)), "2024-01-15T10:30:00+00:00");
        assert_eq!(iso_seize(None), "");
    }
}
