//! Output formatters for run summaries

use anyhow::Result;
use colored::*;
use sheettidy_core::aggregate::AggregateReport;
use sheettidy_core::{OutcomeStatus, RunSummary, SourceOutcome};
use std::collections::BTreeMap;

/// Print the run summary grouped by agency
pub fn print_human(summary: &RunSummary, report: Option<&AggregateReport>) {
    println!(
        "{}",
        format!("Processing: {}", summary.folder.display()).bold()
    );
    println!();

    let mut by_agency: BTreeMap<&str, Vec<&SourceOutcome>> = BTreeMap::new();
    for outcome in &summary.outcomes {
        by_agency.entry(outcome.agency.as_str()).or_default().push(outcome);
    }

    for (agency, outcomes) in &by_agency {
        println!("{} {}", "Agency:".bold(), agency.cyan().bold());
        for outcome in outcomes {
            print_outcome(outcome);
        }
        println!();
    }

    if let Some(report) = report {
        println!("{}", "Aggregate:".bold().underline());
        for path in report.wide_output.iter().chain(report.long_output.iter()) {
            println!("  {} {}", "wrote".green(), path.display());
        }
        for skipped in &report.skipped {
            println!(
                "  {} {} [{}] {}",
                "skipped".yellow(),
                skipped.path.display(),
                skipped.kind.bright_black(),
                skipped.message
            );
        }
        println!();
    }

    println!("{}", "Summary:".bold().underline());
    println!("  {} {}", "Written:".green().bold(), summary.written());
    let existing = summary.count(OutcomeStatus::SkippedExisting);
    if existing > 0 {
        println!("  {} {}", "Existing:".blue().bold(), existing);
    }
    let missing = summary.count(OutcomeStatus::Missing);
    if missing > 0 {
        println!("  {} {}", "Missing:".yellow().bold(), missing);
    }
    if summary.failed() > 0 {
        println!("  {} {}", "Failed:".red().bold(), summary.failed());
    }
}

fn print_outcome(outcome: &SourceOutcome) {
    let status = match outcome.status {
        OutcomeStatus::Written => "OK".green().bold(),
        OutcomeStatus::SkippedExisting => "KEEP".blue().bold(),
        OutcomeStatus::Missing => "MISS".yellow().bold(),
        OutcomeStatus::Failed => "FAIL".red().bold(),
    };

    let detail = match outcome.status {
        OutcomeStatus::Written => format!(
            "{} rows -> {}",
            outcome.rows,
            outcome
                .output
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        ),
        _ => outcome.message.clone().unwrap_or_default(),
    };

    println!(
        "  {} [{}] {} {}",
        status,
        outcome.id.bright_black(),
        outcome.label,
        detail
    );
}

/// Print the run summary in JSON format
pub fn print_json(summary: &RunSummary, report: Option<&AggregateReport>) -> Result<()> {
    let output = serde_json::json!({
        "folder": summary.folder.display().to_string(),
        "sources": summary.outcomes,
        "aggregate": report,
        "summary": {
            "total": summary.outcomes.len(),
            "written": summary.written(),
            "skipped_existing": summary.count(OutcomeStatus::SkippedExisting),
            "missing": summary.count(OutcomeStatus::Missing),
            "failed": summary.failed(),
        }
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
