//! Aggregation of corrected per-source tables
//!
//! Corrected files (`<label>_<YYYYMMDD>(修正).xlsx`) are reloaded through the
//! same reader, layout detector and builder used for raw inputs, then either
//! outer-joined on date (wide) or melted into `(date, source, field, value)`
//! tuples (long).

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::dates::{date_tag, date_tag_year};
use crate::error::{Result, TidyError};
use crate::layout;
use crate::reader::{has_extension, read_grid};
use crate::sources::CORRECTED_MARKER;
use crate::tidy::{self, BuildOptions, Coercion, TidyTable, Value, YearPolicy};
use crate::writer::write_rows;

/// Long-form output header: date, source, field, value
pub const LONG_HEADER: [&str; 4] = ["日期", "資料來源", "欄位名稱", "數值"];

pub fn wide_output_name(tag: &str) -> String {
    format!("總經指標_{}.xlsx", tag)
}

pub fn long_output_name(tag: &str) -> String {
    format!("總經指標彙整_{}.xlsx", tag)
}

/// Which aggregate tables to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AggregateMode {
    Wide,
    Long,
    Both,
}

impl AggregateMode {
    pub fn wide(self) -> bool {
        matches!(self, AggregateMode::Wide | AggregateMode::Both)
    }

    pub fn long(self) -> bool {
        matches!(self, AggregateMode::Long | AggregateMode::Both)
    }
}

/// One row per date, one column per `<source>_<field>`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WideTable {
    pub columns: Vec<String>,
    pub rows: Vec<(String, Vec<Value>)>,
}

impl WideTable {
    pub fn header(&self) -> Vec<String> {
        std::iter::once(tidy::DATE_COLUMN.to_string())
            .chain(self.columns.iter().cloned())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongRow {
    pub date: String,
    pub source: String,
    pub field: String,
    pub value: Value,
}

/// Corrected files in the folder, sorted by name
pub fn collect_corrected(folder: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(folder)
        .map_err(|e| TidyError::read(folder, format!("cannot list folder: {}", e)))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_extension(path, &["xls", "xlsx"]))
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.contains(CORRECTED_MARKER))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Source label from a corrected file name: stem without `(修正)` and the date tag
pub fn label_from_file_name(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    let stem = stem.replace(CORRECTED_MARKER, "");
    let trimmed = match stem.rsplit_once('_') {
        Some((head, tail))
            if !head.is_empty() && tail.len() == 8 && tail.chars().all(|c| c.is_ascii_digit()) =>
        {
            head
        }
        _ => stem.as_str(),
    };
    trimmed.trim().to_string()
}

/// Reload a corrected file as a tidy table labelled by its source
pub fn load_corrected(path: &Path) -> Result<TidyTable> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let label = label_from_file_name(file_name);

    let grid = read_grid(path, None)?;
    let decision = layout::detect(&grid)?;
    let options = BuildOptions {
        year_policy: YearPolicy::FilenameTag,
        tag_year: date_tag_year(file_name),
        coercion: Coercion::Infer,
        ..BuildOptions::new(label)
    };
    tidy::build(&grid, &decision, &options)
}

/// Rows dated strictly before the floor are removed
pub fn apply_floor(table: &TidyTable, floor: Option<&str>) -> TidyTable {
    let Some(floor) = floor else {
        return table.clone();
    };
    TidyTable {
        source: table.source.clone(),
        columns: table.columns.clone(),
        rows: table
            .rows
            .iter()
            .filter(|row| row.date.as_str() >= floor)
            .cloned()
            .collect(),
    }
}

/// First non-null value per column for each date
fn first_non_null_by_date(table: &TidyTable) -> BTreeMap<String, Vec<Value>> {
    let mut grouped: BTreeMap<String, Vec<Value>> = BTreeMap::new();
    for row in &table.rows {
        let slot = grouped
            .entry(row.date.clone())
            .or_insert_with(|| vec![Value::Null; table.columns.len()]);
        for (current, value) in slot.iter_mut().zip(&row.values) {
            if current.is_null() && !value.is_null() {
                *current = value.clone();
            }
        }
    }
    grouped
}

/// Successive outer joins on date, sorted ascending
pub fn aggregate_wide(tables: &[TidyTable], floor: Option<&str>) -> WideTable {
    let mut columns = Vec::new();
    let mut parts = Vec::with_capacity(tables.len());
    for table in tables {
        let table = apply_floor(table, floor);
        let offset = columns.len();
        columns.extend(
            table
                .columns
                .iter()
                .map(|c| format!("{}_{}", table.source, c)),
        );
        parts.push((offset, first_non_null_by_date(&table)));
    }

    let width = columns.len();
    let mut joined: BTreeMap<String, Vec<Value>> = BTreeMap::new();
    for (offset, grouped) in parts {
        for (date, values) in grouped {
            let row = joined
                .entry(date)
                .or_insert_with(|| vec![Value::Null; width]);
            for (i, value) in values.into_iter().enumerate() {
                row[offset + i] = value;
            }
        }
    }

    WideTable {
        columns: tidy::dedupe(columns),
        rows: joined.into_iter().collect(),
    }
}

/// Every value of every source as one tuple, Nulls included
pub fn aggregate_long(tables: &[TidyTable], floor: Option<&str>) -> Vec<LongRow> {
    tables
        .iter()
        .flat_map(|table| {
            table
                .rows
                .iter()
                .filter(move |row| floor.is_none_or(|f| row.date.as_str() >= f))
                .flat_map(move |row| {
                    table
                        .columns
                        .iter()
                        .zip(&row.values)
                        .map(move |(field, value)| LongRow {
                            date: row.date.clone(),
                            source: table.source.clone(),
                            field: field.clone(),
                            value: value.clone(),
                        })
                })
        })
        .collect()
}

pub fn write_wide(path: &Path, table: &WideTable) -> Result<()> {
    let rows: Vec<Vec<Value>> = table
        .rows
        .iter()
        .map(|(date, values)| {
            std::iter::once(Value::Text(date.clone()))
                .chain(values.iter().cloned())
                .collect()
        })
        .collect();
    write_rows(path, &table.header(), &rows)
}

pub fn write_long(path: &Path, rows: &[LongRow]) -> Result<()> {
    let header: Vec<String> = LONG_HEADER.iter().map(|h| h.to_string()).collect();
    let rows: Vec<Vec<Value>> = rows
        .iter()
        .map(|r| {
            vec![
                Value::Text(r.date.clone()),
                Value::Text(r.source.clone()),
                Value::Text(r.field.clone()),
                r.value.clone(),
            ]
        })
        .collect();
    write_rows(path, &header, &rows)
}

/// Tag for output names: the folder name when it is an 8-digit date
pub fn folder_tag(folder: &Path) -> Option<String> {
    let name = folder
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .or_else(|| folder.file_name().map(|n| n.to_string_lossy().into_owned()))?;
    (name.len() == 8 && date_tag(&name).is_some()).then_some(name)
}

#[derive(Debug, Clone)]
pub struct AggregateOptions {
    pub mode: AggregateMode,
    pub floor: Option<String>,
    pub tag: Option<String>,
}

/// A corrected file that could not be used
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateReport {
    pub tag: String,
    pub sources: Vec<String>,
    pub skipped: Vec<SkippedFile>,
    pub dates: usize,
    pub long_rows: usize,
    pub wide_output: Option<PathBuf>,
    pub long_output: Option<PathBuf>,
}

/// Load every corrected file in the folder and write the requested aggregates
pub fn aggregate_folder(folder: &Path, options: &AggregateOptions) -> Result<AggregateReport> {
    let tag = options
        .tag
        .clone()
        .or_else(|| folder_tag(folder))
        .ok_or_else(|| {
            TidyError::Config(format!(
                "{} is not named YYYYMMDD; pass an output tag",
                folder.display()
            ))
        })?;

    let mut tables = Vec::new();
    let mut skipped = Vec::new();
    for path in collect_corrected(folder)? {
        match load_corrected(&path) {
            Ok(table) if table.is_empty() => {
                tracing::warn!("no dated rows in {}, skipping", path.display());
                skipped.push(SkippedFile {
                    path,
                    kind: "layout",
                    message: "no dated rows".to_string(),
                });
            }
            Ok(table) => {
                tracing::info!("loaded {} ({} rows)", table.source, table.len());
                tables.push(table);
            }
            Err(e) => {
                tracing::warn!("skipping {}: {}", path.display(), e);
                skipped.push(SkippedFile {
                    path,
                    kind: e.kind(),
                    message: e.to_string(),
                });
            }
        }
    }

    if tables.is_empty() {
        return Err(TidyError::NoInput {
            label: format!("{} in {}", CORRECTED_MARKER, folder.display()),
        });
    }

    let floor = options.floor.as_deref();
    let mut report = AggregateReport {
        tag: tag.clone(),
        sources: tables.iter().map(|t| t.source.clone()).collect(),
        skipped,
        dates: 0,
        long_rows: 0,
        wide_output: None,
        long_output: None,
    };

    if options.mode.wide() {
        let wide = aggregate_wide(&tables, floor);
        let path = folder.join(wide_output_name(&tag));
        write_wide(&path, &wide)?;
        tracing::info!("wrote {} ({} dates)", path.display(), wide.rows.len());
        report.dates = wide.rows.len();
        report.wide_output = Some(path);
    }

    if options.mode.long() {
        let long = aggregate_long(&tables, floor);
        let path = folder.join(long_output_name(&tag));
        write_long(&path, &long)?;
        tracing::info!("wrote {} ({} rows)", path.display(), long.len());
        report.long_rows = long.len();
        report.long_output = Some(path);
    }

    Ok(report)
}
