//! Tidy table construction
//!
//! The builder walks the data rows of an oriented grid, resolves one
//! `YYYY-MM` date per row and coerces every other cell. Rows without a
//! resolvable date never reach the output.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod coerce;
pub mod header;
pub mod year_carry;

pub use coerce::{Coercion, clean_numeric, coerce, compact_text};
pub use header::{HeaderPrefix, HeaderSpec, dedupe, fill_merged};
pub use year_carry::{RowDate, YearCarry, YearPolicy};

use crate::dates::{YearMonth, title_date};
use crate::error::{Result, TidyError};
use crate::layout::{LayoutDecision, is_total_row};
use crate::reader::CellGrid;

/// Name of the date column, always first in written tables
pub const DATE_COLUMN: &str = "日期";

/// Rows searched for a title date when none is configured
pub const DEFAULT_TITLE_ROWS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Number(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Number(n) => write!(f, "{}", crate::reader::calamine_reader::render_float(*n)),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TidyRow {
    pub date: String,
    pub values: Vec<Value>,
}

/// Dated rows of one source; the date column is implicit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TidyTable {
    pub source: String,
    pub columns: Vec<String>,
    pub rows: Vec<TidyRow>,
}

impl TidyTable {
    pub fn new(source: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            source: source.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Output header with the date column first
    pub fn header(&self) -> Vec<String> {
        std::iter::once(DATE_COLUMN.to_string())
            .chain(self.columns.iter().cloned())
            .collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Remove columns with no value in any row
    pub fn drop_null_columns(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let keep: Vec<bool> = (0..self.columns.len())
            .map(|col| self.rows.iter().any(|row| !row.values[col].is_null()))
            .collect();
        if keep.iter().all(|k| *k) {
            return;
        }

        let mut flags = keep.iter();
        self.columns.retain(|_| *flags.next().unwrap_or(&true));
        for row in &mut self.rows {
            let mut flags = keep.iter();
            row.values.retain(|_| *flags.next().unwrap_or(&true));
        }
    }
}

/// Where a row's date comes from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DateCells {
    /// The date column chosen by the layout
    #[default]
    Column,
    /// Year and month held in two columns
    Split {
        year_column: usize,
        month_column: usize,
    },
    /// One date stated in the title rows applies to every row
    Title {
        #[serde(default = "default_title_rows")]
        scan_rows: usize,
    },
}

fn default_title_rows() -> usize {
    DEFAULT_TITLE_ROWS
}

/// Per-source knobs for [`build`]
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub source: String,
    pub year_policy: YearPolicy,
    pub tag_year: Option<i32>,
    pub coercion: Coercion,
    pub date_cells: DateCells,
    pub text_columns: Vec<usize>,
    pub hierarchy_column: Option<usize>,
    pub required_columns: Vec<usize>,
    pub header_suffix: Option<String>,
    pub header_prefixes: Vec<HeaderPrefix>,
    /// Spread merged header cells over the blank cells they span
    pub merged_headers: bool,
}

impl BuildOptions {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    fn is_text_column(&self, col: usize) -> bool {
        self.text_columns.contains(&col) || self.hierarchy_column == Some(col)
    }
}

/// Build a tidy table from a grid and its layout
pub fn build(grid: &CellGrid, layout: &LayoutDecision, options: &BuildOptions) -> Result<TidyTable> {
    let oriented = layout.orient(grid);
    let grid = oriented.grid.as_ref();

    let date_columns: Vec<usize> = match &options.date_cells {
        DateCells::Column => vec![oriented.date_column],
        DateCells::Split {
            year_column,
            month_column,
        } => vec![*year_column, *month_column],
        DateCells::Title { .. } => Vec::new(),
    };
    let title = match &options.date_cells {
        DateCells::Title { scan_rows } => Some(find_title_date(grid, *scan_rows).ok_or_else(|| {
            TidyError::layout(format!("no title date in the first {} rows", scan_rows))
        })?),
        _ => None,
    };

    let renamed: Vec<(usize, &str)> = date_columns
        .first()
        .map(|&c| vec![(c, DATE_COLUMN)])
        .unwrap_or_default();
    let filled;
    let header_grid = if options.merged_headers {
        filled = fill_merged(grid, &oriented.header_rows, &date_columns);
        &filled
    } else {
        grid
    };
    let header = HeaderSpec::from_grid(
        header_grid,
        &oriented.header_rows,
        options.header_suffix.as_deref(),
        &options.header_prefixes,
        &renamed,
    );
    let value_columns: Vec<usize> = (0..grid.width())
        .filter(|c| !date_columns.contains(c))
        .collect();

    let mut names: Vec<String> = std::iter::once(DATE_COLUMN.to_string())
        .chain(value_columns.iter().map(|&c| header.get(c).unwrap_or_default().to_string()))
        .collect();
    names = dedupe(names);
    names.remove(0);

    let mut table = TidyTable::new(options.source.clone(), names);
    let mut carry = YearCarry::new(options.year_policy, options.tag_year);
    let mut parent: Option<String> = None;
    let mut dropped = 0usize;

    for r in oriented.data_start..oriented.data_end {
        if grid.is_blank_row(r) {
            continue;
        }

        let classified = match (&options.date_cells, title) {
            (DateCells::Title { .. }, Some(ym)) => {
                let first = grid.cell(r, 0).trim();
                if first.is_empty() {
                    RowDate::Empty
                } else if is_total_row(first) {
                    RowDate::Total
                } else {
                    RowDate::Date(ym)
                }
            }
            (
                DateCells::Split {
                    year_column,
                    month_column,
                },
                _,
            ) => carry.classify_split(grid.cell(r, *year_column), grid.cell(r, *month_column)),
            _ => carry.classify(grid.cell(r, oriented.date_column)),
        };

        let date = match classified {
            RowDate::Date(ym) => ym,
            RowDate::Total => {
                tracing::debug!("{}: total row {} ends the data", options.source, r);
                break;
            }
            RowDate::Empty | RowDate::YearMarker(_) => continue,
            RowDate::Unresolved => {
                dropped += 1;
                tracing::debug!(
                    "{}: row {} has no resolvable date ({:?})",
                    options.source,
                    r,
                    grid.row(r).first()
                );
                continue;
            }
        };

        let values: Vec<Value> = value_columns
            .iter()
            .map(|&c| cell_value(grid.cell(r, c), c, options, &mut parent))
            .collect();

        let missing_required = value_columns
            .iter()
            .zip(&values)
            .any(|(c, v)| options.required_columns.contains(c) && v.is_null());
        if missing_required {
            dropped += 1;
            continue;
        }

        table.rows.push(TidyRow {
            date: date.to_string(),
            values,
        });
    }

    table.drop_null_columns();
    tracing::debug!(
        "{}: {} rows, {} columns, {} rows dropped",
        options.source,
        table.len(),
        table.columns.len(),
        dropped
    );
    Ok(table)
}

fn cell_value(raw: &str, col: usize, options: &BuildOptions, parent: &mut Option<String>) -> Value {
    if options.hierarchy_column == Some(col) {
        return hierarchy_value(raw, parent);
    }
    if options.is_text_column(col) {
        return coerce::text_value(raw);
    }
    coerce(raw, options.coercion)
}

/// Indented labels (leading space or U+3000) are children of the last unindented one
fn hierarchy_value(raw: &str, parent: &mut Option<String>) -> Value {
    let label = compact_text(raw);
    if label.is_empty() {
        return Value::Null;
    }
    let indented = raw.starts_with([' ', '\u{3000}', '\t']);
    if !indented {
        *parent = Some(label.clone());
        return Value::Text(label);
    }
    match parent {
        Some(p) => Value::Text(format!("{}_{}", p, label)),
        None => Value::Text(label),
    }
}

fn find_title_date(grid: &CellGrid, scan_rows: usize) -> Option<YearMonth> {
    (0..scan_rows.min(grid.height()))
        .flat_map(|r| grid.row(r).iter())
        .find_map(|cell| title_date(cell))
}
