use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use colored::*;
use sheettidy_core::TidyConfig;
use sheettidy_core::aggregate::{AggregateMode, AggregateOptions, AggregateReport, aggregate_folder};
use sheettidy_core::config::DEFAULT_CONFIG_FILE;
use sheettidy_core::dates::normalize_date;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "sheetagg")]
#[command(about = "Combine corrected tables into the wide and long macro indicator workbooks")]
#[command(version)]
struct Cli {
    /// Folder holding the corrected files, usually named YYYYMMDD
    #[arg(value_name = "FOLDER", default_value = ".")]
    folder: PathBuf,

    /// Which aggregate to write
    #[arg(short, long, value_enum, default_value = "both")]
    mode: Mode,

    /// Drop rows dated before this month (YYYY-MM); overrides min_date
    #[arg(long, value_name = "YYYY-MM")]
    floor: Option<String>,

    /// Tag used in output names instead of the folder name
    #[arg(short, long)]
    tag: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// One row per date, one column per source field
    Wide,
    /// One row per date, source, field and value
    Long,
    /// Both workbooks
    Both,
}

impl From<Mode> for AggregateMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Wide => AggregateMode::Wide,
            Mode::Long => AggregateMode::Long,
            Mode::Both => AggregateMode::Both,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

fn load_config(path: Option<&PathBuf>) -> Result<TidyConfig> {
    if let Some(config_path) = path {
        return TidyConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()));
    }

    let default_config_path = PathBuf::from(DEFAULT_CONFIG_FILE);
    if default_config_path.exists() {
        TidyConfig::from_file(&default_config_path).with_context(|| {
            format!(
                "Failed to load config from {}",
                default_config_path.display()
            )
        })
    } else {
        Ok(TidyConfig::default())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_ref())?;
    config.validate().context("Invalid configuration")?;

    let floor = match &cli.floor {
        Some(raw) => match normalize_date(raw) {
            Some(floor) => Some(floor),
            None => bail!("--floor '{}' is not a year-month", raw),
        },
        None => config.min_date(),
    };

    let options = AggregateOptions {
        mode: cli.mode.into(),
        floor,
        tag: cli.tag.clone(),
    };

    let report = aggregate_folder(&cli.folder, &options)
        .with_context(|| format!("Failed to aggregate folder: {}", cli.folder.display()))?;

    match cli.format {
        OutputFormat::Human => print_human(&report, options.floor.as_deref()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(())
}

fn print_human(report: &AggregateReport, floor: Option<&str>) {
    println!("{}", format!("Aggregate: {}", report.tag).bold());
    if let Some(floor) = floor {
        println!("  {} {}", "Floor:".bold(), floor);
    }
    println!();

    println!("{}", "Sources:".bold().underline());
    for source in &report.sources {
        println!("  {}", source.cyan());
    }
    for skipped in &report.skipped {
        println!(
            "  {} {} [{}] {}",
            "SKIP".yellow().bold(),
            skipped.path.display(),
            skipped.kind.bright_black(),
            skipped.message
        );
    }
    println!();

    if let Some(path) = &report.wide_output {
        println!(
            "{} {} ({} dates)",
            "Wide:".green().bold(),
            path.display(),
            report.dates
        );
    }
    if let Some(path) = &report.long_output {
        println!(
            "{} {} ({} rows)",
            "Long:".green().bold(),
            path.display(),
            report.long_rows
        );
    }
}
