//! sheettidy: normalization of government statistics spreadsheets
//!
//! Raw monthly tables from several portals are read into a string grid,
//! their layout is detected (header rows, orientation, date column), and
//! each dated row is emitted as `YYYY-MM` plus coerced values. Corrected
//! tables can then be aggregated into one wide or long workbook.

pub mod aggregate;
pub mod config;
pub mod dates;
pub mod error;
pub mod layout;
pub mod mapper;
pub mod reader;
pub mod sources;
pub mod summary;
pub mod tidy;
pub mod writer;

use rayon::prelude::*;
use std::path::Path;

pub use config::TidyConfig;
pub use error::{Result, TidyError};
pub use layout::LayoutDecision;
pub use reader::{CellGrid, read_grid};
pub use sources::{SourceSpec, builtin_sources};
pub use summary::{OutcomeStatus, RunSummary, SourceOutcome};
pub use tidy::{TidyRow, TidyTable, Value};

use dates::date_tag_year;
use mapper::{map_table, prefix_columns};

/// Batch preprocessing of a dated input folder
pub struct Preprocessor {
    config: TidyConfig,
    overwrite: bool,
}

impl Preprocessor {
    /// Create a preprocessor with default configuration
    pub fn new() -> Self {
        Self::with_config(TidyConfig::default())
    }

    /// Create a preprocessor with custom configuration
    pub fn with_config(config: TidyConfig) -> Self {
        let overwrite = config.overwrite();
        Self { config, overwrite }
    }

    /// Replace existing corrected files instead of skipping them
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn config(&self) -> &TidyConfig {
        &self.config
    }

    /// Built-in and custom sources that are enabled, with overrides applied
    pub fn sources(&self) -> Result<Vec<SourceSpec>> {
        builtin_sources()
            .iter()
            .chain(self.config.custom.iter())
            .filter(|spec| self.config.is_source_enabled(spec))
            .map(|spec| self.config.apply_overrides(spec))
            .collect()
    }

    /// Run every enabled source against the folder; failures are recorded, not raised
    pub fn process_folder<P: AsRef<Path>>(&self, folder: P) -> Result<RunSummary> {
        let folder = folder.as_ref();
        if !folder.is_dir() {
            return Err(TidyError::read(folder, "not a directory"));
        }
        let sources = self.sources()?;
        tracing::info!("processing {} sources in {}", sources.len(), folder.display());

        let outcomes = sources
            .par_iter()
            .map(|spec| self.run_source(spec, folder))
            .collect();

        Ok(RunSummary {
            folder: folder.to_path_buf(),
            outcomes,
        })
    }

    fn run_source(&self, spec: &SourceSpec, folder: &Path) -> SourceOutcome {
        let input = match spec.find_input(folder) {
            Ok(Some(input)) => input,
            Ok(None) => {
                tracing::warn!("{}: no input matching '{}_*'", spec.id, spec.label);
                return SourceOutcome::missing(spec);
            }
            Err(e) => {
                tracing::warn!("{}: {}", spec.id, e);
                return SourceOutcome::failed(spec, None, &e);
            }
        };

        let output = spec.output_path(&input);
        if output.exists() && !self.overwrite {
            tracing::info!("{}: {} exists, skipping", spec.id, output.display());
            return SourceOutcome::skipped_existing(spec, input, output);
        }

        tracing::info!("{}: reading {}", spec.id, input.display());
        let result = self
            .process_file(spec, &input)
            .and_then(|table| writer::write_table(&output, &table).map(|_| table.len()));

        match result {
            Ok(rows) => {
                tracing::info!("{}: wrote {} rows to {}", spec.id, rows, output.display());
                SourceOutcome::written(spec, input, output, rows)
            }
            Err(e) => {
                tracing::warn!("{}: {}", spec.id, e);
                SourceOutcome::failed(spec, Some(input), &e)
            }
        }
    }

    /// Tidy table for one input file, without writing it
    pub fn process_file<P: AsRef<Path>>(&self, spec: &SourceSpec, path: P) -> Result<TidyTable> {
        let path = path.as_ref();
        let grid = read_grid(path, spec.sheet.as_deref())?;
        let decision = spec.layout_for(&grid)?;
        tracing::debug!("{}: {:?}", spec.id, decision);

        let tag_year = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(date_tag_year);
        let table = tidy::build(&grid, &decision, &spec.build_options(tag_year))?;

        let table = if !spec.mapping.is_empty() {
            map_table(&table, &spec.mapping, spec.output_prefix.as_deref())
        } else if let Some(prefix) = &spec.output_prefix {
            prefix_columns(table, prefix)
        } else {
            table
        };

        if table.is_empty() {
            return Err(TidyError::layout(format!(
                "no dated rows in {}",
                path.display()
            )));
        }
        Ok(table)
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources_respect_config() {
        let config = TidyConfig::from_toml(
            r#"
            [global]
            enabled_sources = ["MOI", "CUSTOM01"]

            [sources.MOI01]
            sheet = "Monthly"

            [[custom]]
            id = "CUSTOM01"
            label = "自訂指標"
            "#,
        )
        .unwrap();
        let preprocessor = Preprocessor::with_config(config);
        let sources = preprocessor.sources().unwrap();
        let ids: Vec<&str> = sources.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["MOI01", "MOI02", "MOI03", "CUSTOM01"]);
        assert_eq!(sources[0].sheet.as_deref(), Some("Monthly"));
    }

    #[test]
    fn test_overwrite_from_config() {
        let config = TidyConfig::from_toml("[global]\noverwrite = true").unwrap();
        assert!(Preprocessor::with_config(config).overwrite);
        assert!(!Preprocessor::default().overwrite);
        assert!(Preprocessor::new().with_overwrite(true).overwrite);
    }

    #[test]
    fn test_missing_folder_is_read_error() {
        let err = Preprocessor::new()
            .process_folder("/nonexistent/20251105")
            .unwrap_err();
        assert_eq!(err.kind(), "read");
    }
}
