//! Spreadsheet loading into untyped string grids
//!
//! Readers are tried in order; the first one that accepts the file extension
//! and succeeds wins. A file no reader can parse yields [`TidyError::Read`]
//! carrying the reason each strategy gave up.

use anyhow::Result;
use std::path::Path;

pub mod calamine_reader;
pub mod grid;
pub mod parser_utils;
pub mod table_json;
pub mod xlsx_fallback;

pub use calamine_reader::CalamineReader;
pub use grid::CellGrid;
pub use table_json::CapturedTableReader;
pub use xlsx_fallback::XlsxXmlReader;

use crate::error::TidyError;

/// Strategy for turning one file into a grid of strings
pub trait GridReader: Send + Sync {
    /// Short name used in logs and error reports
    fn name(&self) -> &'static str;

    /// Whether this reader should be attempted for the path
    fn accepts(&self, path: &Path) -> bool;

    /// Read the named sheet (or the first one) as strings
    fn read(&self, path: &Path, sheet: Option<&str>) -> Result<CellGrid>;
}

/// Readers in the order they are attempted
pub fn default_readers() -> Vec<Box<dyn GridReader>> {
    vec![
        Box::new(CalamineReader),
        Box::new(XlsxXmlReader),
        Box::new(CapturedTableReader),
    ]
}

/// Read a file with the default reader chain
pub fn read_grid<P: AsRef<Path>>(path: P, sheet: Option<&str>) -> crate::Result<CellGrid> {
    read_grid_with(&default_readers(), path.as_ref(), sheet)
}

/// Read a file with an explicit reader chain
pub fn read_grid_with(
    readers: &[Box<dyn GridReader>],
    path: &Path,
    sheet: Option<&str>,
) -> crate::Result<CellGrid> {
    let mut failures = Vec::new();

    for reader in readers.iter().filter(|r| r.accepts(path)) {
        match reader.read(path, sheet) {
            Ok(grid) => {
                tracing::debug!(
                    "{} read {} ({}x{})",
                    reader.name(),
                    path.display(),
                    grid.height(),
                    grid.width()
                );
                return Ok(grid);
            }
            Err(e) => {
                tracing::warn!("{} failed on {}: {:#}", reader.name(), path.display(), e);
                failures.push(format!("{}: {:#}", reader.name(), e));
            }
        }
    }

    let reason = if failures.is_empty() {
        "unsupported file extension".to_string()
    } else {
        failures.join("; ")
    };
    Err(TidyError::read(path, reason))
}

/// Case-insensitive extension check
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}
