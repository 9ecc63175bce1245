//! Writer module for tidy and aggregate workbooks

mod xlsx_writer;

pub use xlsx_writer::{worksheet_xml, write_workbook};

use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Result, TidyError};
use crate::tidy::{TidyTable, Value};

/// Write a header and rows to a single-sheet `.xlsx`.
///
/// The workbook is built in a temporary file beside `path` and renamed into
/// place, so a failed write never leaves a truncated file at `path`.
pub fn write_rows<P: AsRef<Path>>(path: P, header: &[String], rows: &[Vec<Value>]) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(".sheettidy-")
        .suffix(".xlsx.part")
        .tempfile_in(dir)
        .map_err(|e| TidyError::write(path, e))?;

    {
        let mut out = write_workbook(BufWriter::new(tmp.as_file_mut()), header, rows)
            .map_err(|e| TidyError::write(path, std::io::Error::other(format!("{:#}", e))))?;
        out.flush().map_err(|e| TidyError::write(path, e))?;
    }
    tmp.persist(path).map_err(|e| TidyError::write(path, e.error))?;

    tracing::debug!("wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Write a tidy table with the date column first, stored as text
pub fn write_table<P: AsRef<Path>>(path: P, table: &TidyTable) -> Result<()> {
    let rows: Vec<Vec<Value>> = table
        .rows
        .iter()
        .map(|row| {
            std::iter::once(Value::Text(row.date.clone()))
                .chain(row.values.iter().cloned())
                .collect()
        })
        .collect();
    write_rows(path, &table.header(), &rows)
}
