use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use colored::*;
use serde::Serialize;
use sheettidy_core::dates::date_tag_year;
use sheettidy_core::layout::{self, HEADER_SCAN_ROWS};
use sheettidy_core::tidy::{self, BuildOptions, Coercion, YearPolicy};
use sheettidy_core::{CellGrid, LayoutDecision, Preprocessor, TidyTable, read_grid};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "sheetinspect")]
#[command(about = "Show the grid, layout decision and first tidy rows of one file")]
#[command(version)]
struct Cli {
    /// Spreadsheet or captured table to inspect
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Sheet to read instead of the first one
    #[arg(short, long)]
    sheet: Option<String>,

    /// Number of tidy rows to show
    #[arg(short, long, default_value_t = 10)]
    rows: usize,

    /// Use a registered source profile (e.g. MOI01) instead of detection
    #[arg(long, value_name = "ID")]
    source: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    format: OutputFormat,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

#[derive(Serialize)]
struct Inspection {
    file: String,
    height: usize,
    width: usize,
    layout: Option<LayoutDecision>,
    columns: Vec<String>,
    total_rows: usize,
    rows: Vec<tidy::TidyRow>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let (grid, decision, table) = match &cli.source {
        Some(id) => inspect_with_source(&cli, id)?,
        None => inspect_detected(&cli)?,
    };

    let inspection = Inspection {
        file: cli.file.display().to_string(),
        height: grid.height(),
        width: grid.width(),
        layout: decision,
        columns: table.header(),
        total_rows: table.len(),
        rows: table.rows.iter().take(cli.rows).cloned().collect(),
    };

    match cli.format {
        OutputFormat::Human => print_human(&grid, &inspection),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&inspection)?),
    }
    Ok(())
}

fn inspect_detected(cli: &Cli) -> Result<(CellGrid, Option<LayoutDecision>, TidyTable)> {
    let grid = read_grid(&cli.file, cli.sheet.as_deref())
        .with_context(|| format!("Failed to read file: {}", cli.file.display()))?;
    let decision = layout::detect(&grid).context("Layout detection failed")?;

    let file_name = cli
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let options = BuildOptions {
        year_policy: YearPolicy::FilenameTag,
        tag_year: date_tag_year(file_name),
        coercion: Coercion::Infer,
        ..BuildOptions::new(file_name)
    };
    let table = tidy::build(&grid, &decision, &options).context("Failed to build tidy table")?;
    Ok((grid, Some(decision), table))
}

fn inspect_with_source(cli: &Cli, id: &str) -> Result<(CellGrid, Option<LayoutDecision>, TidyTable)> {
    let preprocessor = Preprocessor::new();
    let mut spec = preprocessor
        .sources()?
        .into_iter()
        .find(|s| s.id == id)
        .ok_or_else(|| anyhow!("Unknown source '{}'", id))?;
    if cli.sheet.is_some() {
        spec.sheet = cli.sheet.clone();
    }

    let grid = read_grid(&cli.file, spec.sheet.as_deref())
        .with_context(|| format!("Failed to read file: {}", cli.file.display()))?;
    let decision = spec.layout_for(&grid).ok();
    let table = preprocessor
        .process_file(&spec, &cli.file)
        .with_context(|| format!("{} could not process {}", id, cli.file.display()))?;
    Ok((grid, decision, table))
}

fn print_human(grid: &CellGrid, inspection: &Inspection) {
    println!("{}", format!("Inspecting: {}", inspection.file).bold());
    println!(
        "  {} {} rows x {} columns",
        "Grid:".bold(),
        inspection.height,
        inspection.width
    );
    println!();

    println!("{}", "Leading rows:".bold().underline());
    for r in 0..grid.height().min(HEADER_SCAN_ROWS) {
        println!("  {:>3} {}", r.to_string().bright_black(), grid.row(r).join(" | "));
    }
    println!();

    if let Some(decision) = &inspection.layout {
        println!("{}", "Layout:".bold().underline());
        println!("  header rows: {:?}", decision.header_rows);
        println!("  transpose:   {}", decision.transpose);
        println!("  data start:  {}", decision.data_start);
        match decision.data_end {
            Some(end) => println!("  data end:    {} (total row)", end),
            None => println!("  data end:    end of sheet"),
        }
        println!("  date column: {}", decision.date_column);
        println!();
    }

    println!(
        "{} ({} of {})",
        "Tidy rows:".bold().underline(),
        inspection.rows.len(),
        inspection.total_rows
    );
    println!("  {}", inspection.columns.join(" | ").cyan());
    for row in &inspection.rows {
        let values: Vec<String> = row.values.iter().map(|v| v.to_string()).collect();
        println!("  {} | {}", row.date.green(), values.join(" | "));
    }
}
