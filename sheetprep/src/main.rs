use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use sheettidy_core::aggregate::{AggregateMode, AggregateOptions, aggregate_folder};
use sheettidy_core::config::DEFAULT_CONFIG_FILE;
use sheettidy_core::{Preprocessor, TidyConfig};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt};

mod formatter;

#[derive(Parser)]
#[command(name = "sheetprep")]
#[command(about = "Normalize downloaded statistics tables into dated tidy workbooks", long_about = None)]
#[command(version)]
struct Cli {
    /// Folder holding the downloaded files, usually named YYYYMMDD
    #[arg(value_name = "FOLDER", default_value = ".")]
    folder: PathBuf,

    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    format: OutputFormat,

    /// Replace corrected files that already exist
    #[arg(long)]
    overwrite: bool,

    /// Build the wide and long aggregates afterwards
    #[arg(short, long)]
    aggregate: bool,

    /// Only log warnings
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON output for scripting
    Json,
}

fn load_config(path: Option<&PathBuf>) -> Result<TidyConfig> {
    if let Some(config_path) = path {
        return TidyConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()));
    }

    // Try to load default config from current directory if it exists
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

    let default_level = if cli.quiet { "warn" } else { "info" };
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_ref())?;

    config.validate().context("Invalid configuration")?;

    let floor = config.min_date();
    let mut preprocessor = Preprocessor::with_config(config);
    if cli.overwrite {
        preprocessor = preprocessor.with_overwrite(true);
    }

    let summary = preprocessor
        .process_folder(&cli.folder)
        .with_context(|| format!("Failed to process folder: {}", cli.folder.display()))?;

    let report = if cli.aggregate {
        let options = AggregateOptions {
            mode: AggregateMode::Both,
            floor,
            tag: None,
        };
        match aggregate_folder(&cli.folder, &options) {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::warn!("aggregation skipped: {}", e);
                None
            }
        }
    } else {
        None
    };

    match cli.format {
        OutputFormat::Human => formatter::print_human(&summary, report.as_ref()),
        OutputFormat::Json => formatter::print_json(&summary, report.as_ref())?,
    }

    // Failed sources are reported, not fatal
    Ok(())
}
