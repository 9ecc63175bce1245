//! Layout detection: header rows, orientation and data region of a grid

use serde::Serialize;
use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;

use crate::dates::{bare_month, is_period_cell, month_marker, parse_full_date, year_marker};
use crate::error::{Result, TidyError};
use crate::reader::CellGrid;

/// Rows inspected when looking for a header or a month header row
pub const HEADER_SCAN_ROWS: usize = 6;

const DATE_COLUMN_THRESHOLD: f64 = 0.6;
const EMPTY_COLUMN_THRESHOLD: f64 = 0.1;
const HEADER_ROW_THRESHOLD: f64 = 0.4;
const MONTH_ROW_THRESHOLD: f64 = 0.4;
const MONTH_ROW_MIN_CELLS: usize = 3;

/// Where the header and data live in a grid, and whether it runs sideways.
///
/// Row indices refer to the grid as read. When `transpose` is set, the header
/// rows are folded into one line, the data rows are appended below it and
/// the result is flipped; see [`LayoutDecision::orient`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutDecision {
    pub header_rows: Vec<usize>,
    pub transpose: bool,
    pub data_start: usize,
    pub data_end: Option<usize>,
    pub date_column: usize,
}

/// A grid in row-per-period orientation plus the region to walk
#[derive(Debug, Clone)]
pub struct OrientedGrid<'a> {
    pub grid: Cow<'a, CellGrid>,
    pub header_rows: Vec<usize>,
    pub data_start: usize,
    pub data_end: usize,
    pub date_column: usize,
}

impl LayoutDecision {
    /// Decision for a source whose header rows and first data row are known
    pub fn fixed(grid: &CellGrid, header_rows: Vec<usize>, data_start: usize) -> Self {
        Self {
            data_end: find_data_end(grid, data_start),
            header_rows,
            transpose: false,
            data_start,
            date_column: 0,
        }
    }

    fn rows(grid: &CellGrid, header_row: usize, date_column: usize) -> Self {
        let data_start = header_row + 1;
        Self {
            header_rows: vec![header_row],
            transpose: false,
            data_start,
            data_end: find_data_end(grid, data_start),
            date_column,
        }
    }

    fn columns(header_rows: Vec<usize>) -> Self {
        let data_start = header_rows.last().map(|r| r + 1).unwrap_or(0);
        Self {
            header_rows,
            transpose: true,
            data_start,
            data_end: None,
            date_column: 0,
        }
    }

    /// Apply the decision, flipping the grid when the table runs sideways
    pub fn orient<'a>(&self, grid: &'a CellGrid) -> OrientedGrid<'a> {
        if !self.transpose {
            return OrientedGrid {
                grid: Cow::Borrowed(grid),
                header_rows: self.header_rows.clone(),
                data_start: self.data_start,
                data_end: self.data_end.unwrap_or(grid.height()).min(grid.height()),
                date_column: self.date_column,
            };
        }

        let end = self.data_end.unwrap_or(grid.height()).min(grid.height());
        let mut rows = Vec::with_capacity(end.saturating_sub(self.data_start) + 1);
        rows.push(
            (0..grid.width())
                .map(|col| combine_fragments(self.header_rows.iter().map(|&r| grid.cell(r, col))))
                .collect::<Vec<_>>(),
        );
        rows.extend((self.data_start..end).map(|r| grid.row(r).to_vec()));

        let flipped = CellGrid::from_rows(rows).transpose();
        let data_end = find_data_end(&flipped, 1).unwrap_or(flipped.height());
        OrientedGrid {
            grid: Cow::Owned(flipped),
            header_rows: vec![0],
            data_start: 1,
            data_end,
            date_column: 0,
        }
    }
}

/// Inspect a grid and decide its layout
pub fn detect(grid: &CellGrid) -> Result<LayoutDecision> {
    if grid.is_empty() {
        return Err(TidyError::layout("grid is empty"));
    }

    let header_row = guess_header_row(grid);
    let data_start = header_row + 1;

    // explicit date column
    let (best_col, best_fraction) = (0..grid.width())
        .map(|col| (col, date_fraction(grid, col, data_start)))
        .fold((0, 0.0), |best, cur| if cur.1 > best.1 { cur } else { best });
    if best_fraction >= DATE_COLUMN_THRESHOLD {
        tracing::debug!(
            "date column {} ({:.0}% date-like) under header row {}",
            best_col,
            best_fraction * 100.0,
            header_row
        );
        return Ok(LayoutDecision::rows(grid, header_row, best_col));
    }

    // months running along columns
    let dated_headers = (0..grid.width())
        .filter(|&col| is_period_cell(grid.cell(header_row, col)))
        .count();
    if dated_headers >= 2 {
        let label = candidate_column(grid, data_start, |col| {
            is_period_cell(grid.cell(header_row, col))
        });
        if non_empty_fraction(grid, label, data_start) < EMPTY_COLUMN_THRESHOLD {
            tracing::debug!("{} date-like headers in row {}, transposing", dated_headers, header_row);
            return Ok(LayoutDecision::columns(vec![header_row]));
        }
    }
    if let Some(month_row) = find_month_header_row(grid) {
        let label = candidate_column(grid, month_row + 1, |col| {
            bare_month(grid.cell(month_row, col)).is_some()
        });
        if non_empty_fraction(grid, label, month_row + 1) < EMPTY_COLUMN_THRESHOLD {
            tracing::debug!("month header row {}, transposing", month_row);
            return Ok(LayoutDecision::columns(vec![month_row]));
        }
    }

    // headers split across several leading rows
    for count in [2, 3] {
        if header_row + count > grid.height() {
            break;
        }
        let rows: Vec<usize> = (header_row..header_row + count).collect();
        let dated = (0..grid.width())
            .map(|col| combine_fragments(rows.iter().map(|&r| grid.cell(r, col))))
            .filter(|h| looks_like_period(h))
            .count();
        if dated >= 2 {
            tracing::debug!("{} combined header rows name periods, transposing", count);
            return Ok(LayoutDecision::columns(rows));
        }
    }

    // year rows followed by month rows
    if let Some(col) = marker_column(grid, data_start) {
        tracing::debug!("year/month marker column {}", col);
        return Ok(LayoutDecision::rows(grid, header_row, col));
    }

    Err(TidyError::layout(
        "no date column, transposed header or combined header found",
    ))
}

/// First of the leading rows that reads like a header, defaulting to row 0
pub fn guess_header_row(grid: &CellGrid) -> usize {
    let width = grid.width().max(1) as f64;
    (0..grid.height().min(HEADER_SCAN_ROWS))
        .find(|&r| {
            let cells: Vec<&str> = grid
                .row(r)
                .iter()
                .map(|c| c.trim())
                .filter(|c| !c.is_empty())
                .collect();
            if cells.len() < 2 {
                return false;
            }
            let labelled = cells
                .iter()
                .filter(|c| is_period_cell(c) || is_text_like(c))
                .count();
            labelled as f64 / width >= HEADER_ROW_THRESHOLD
        })
        .unwrap_or(0)
}

/// Row among the first few where most cells are month numbers 1 to 12
pub fn find_month_header_row(grid: &CellGrid) -> Option<usize> {
    (0..grid.height().min(HEADER_SCAN_ROWS)).find(|&r| {
        let cells: Vec<&str> = grid
            .row(r)
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .collect();
        let months = cells.iter().filter(|c| bare_month(c).is_some()).count();
        months >= MONTH_ROW_MIN_CELLS
            && months as f64 / cells.len() as f64 >= MONTH_ROW_THRESHOLD
    })
}

/// First data row index whose first cell is a total row
pub fn find_data_end(grid: &CellGrid, data_start: usize) -> Option<usize> {
    (data_start..grid.height()).find(|&r| is_total_row(grid.cell(r, 0)))
}

/// A summary row such as `合計`, `總 計` or `Grand Total`.
///
/// Rows carrying a year (`105年 合計`) are year markers, not totals.
pub fn is_total_row(cell: &str) -> bool {
    let compact: String = cell
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    if compact.is_empty() || compact.contains('年') || compact.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    ["合計", "總計", "total"].iter().any(|m| compact.contains(m))
}

/// Join non-empty, whitespace-normalized fragments with one space
pub fn combine_fragments<'a>(fragments: impl Iterator<Item = &'a str>) -> String {
    fragments
        .map(normalize_whitespace)
        .filter(|f| !f.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_text_like(cell: &str) -> bool {
    cell.chars()
        .any(|c| !(c.is_ascii_digit() || c.is_whitespace() || matches!(c, '.' | ',' | '-' | '+' | '%')))
}

/// A combined header naming a period: a date, or a number marked 年 or 月
fn looks_like_period(header: &str) -> bool {
    static PERIOD_WORD: OnceLock<Regex> = OnceLock::new();
    let re = PERIOD_WORD.get_or_init(|| Regex::new(r"\d{1,4}\s*[年月]").unwrap());
    is_period_cell(header) || re.is_match(header)
}

fn date_fraction(grid: &CellGrid, col: usize, from: usize) -> f64 {
    let values: Vec<&str> = grid
        .column(col)
        .skip(from)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect();
    if values.is_empty() {
        return 0.0;
    }
    let dated = values.iter().filter(|v| is_period_cell(v)).count();
    dated as f64 / values.len() as f64
}

fn non_empty_fraction(grid: &CellGrid, col: usize, from: usize) -> f64 {
    let total = grid.height().saturating_sub(from);
    if total == 0 {
        return 0.0;
    }
    let filled = grid
        .column(col)
        .skip(from)
        .filter(|v| !v.trim().is_empty())
        .count();
    filled as f64 / total as f64
}

/// Fullest column not headed by a period, else the first column
fn candidate_column(grid: &CellGrid, data_start: usize, is_period_column: impl Fn(usize) -> bool) -> usize {
    (0..grid.width())
        .filter(|&col| !is_period_column(col))
        .map(|col| {
            let filled = grid
                .column(col)
                .skip(data_start)
                .filter(|v| !v.trim().is_empty())
                .count();
            (col, filled)
        })
        .fold(None, |best: Option<(usize, usize)>, cur| match best {
            Some(b) if b.1 >= cur.1 => Some(b),
            _ => Some(cur),
        })
        .map(|(col, _)| col)
        .unwrap_or(0)
}

/// Column holding both year markers (or full dates) and month markers
fn marker_column(grid: &CellGrid, data_start: usize) -> Option<usize> {
    (0..grid.width())
        .filter_map(|col| {
            let mut years = 0;
            let mut months = 0;
            for value in grid.column(col).skip(data_start) {
                if parse_full_date(value).is_some() || year_marker(value).is_some() {
                    years += 1;
                } else if month_marker(value).is_some() {
                    months += 1;
                }
            }
            (years > 0 && months > 0).then_some((col, years + months))
        })
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
        .map(|(col, _)| col)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_column_detected() {
        let grid = CellGrid::from_strs(&[
            &["消費者物價指數", "", ""],
            &["日期", "指數", "年增率"],
            &["2024-01", "101.2", "2.1"],
            &["2024-02", "101.9", "2.4"],
            &["2024-03", "102.0", "2.0"],
        ]);
        let layout = detect(&grid).unwrap();
        assert_eq!(layout.header_rows, vec![1]);
        assert!(!layout.transpose);
        assert_eq!(layout.data_start, 2);
        assert_eq!(layout.data_end, None);
        assert_eq!(layout.date_column, 0);
    }

    #[test]
    fn test_months_as_columns_are_transposed() {
        let grid = CellGrid::from_strs(&[
            &["項目", "2024-01", "2024-02", "2024-03"],
            &["", "10", "11", "12"],
            &["", "20", "21", "22"],
        ]);
        let layout = detect(&grid).unwrap();
        assert!(layout.transpose);

        let oriented = layout.orient(&grid);
        let dates: Vec<&str> = oriented.grid.column(0).skip(oriented.data_start).collect();
        assert_eq!(dates, vec!["2024-01", "2024-02", "2024-03"]);
        assert_eq!(oriented.grid.row(1), &["2024-01", "10", "20"]);
    }

    #[test]
    fn test_month_header_row_is_transposed() {
        let grid = CellGrid::from_strs(&[
            &["單位：件", "", "", "", ""],
            &["", "1", "2", "3", "4"],
            &["", "30", "31", "29", "33"],
        ]);
        let layout = detect(&grid).unwrap();
        assert!(layout.transpose);
        assert_eq!(layout.header_rows, vec![1]);
        assert_eq!(layout.data_start, 2);
    }

    #[test]
    fn test_total_row_ends_data() {
        let grid = CellGrid::from_strs(&[
            &["日期", "數量"],
            &["2024-01", "1"],
            &["2024-02", "2"],
            &["合　計", "3"],
            &["2024-03", "9"],
        ]);
        let layout = detect(&grid).unwrap();
        assert_eq!(layout.data_end, Some(3));
        assert_eq!(layout.orient(&grid).data_end, 3);
    }

    #[test]
    fn test_total_row_recognition() {
        assert!(is_total_row("合計"));
        assert!(is_total_row("總　計"));
        assert!(is_total_row(" Grand Total "));
        assert!(!is_total_row("105年 合計"));
        assert!(!is_total_row("一○五年合計"));
        assert!(!is_total_row("臺北市"));
        assert!(!is_total_row(""));
    }

    #[test]
    fn test_year_month_markers_detected() {
        let grid = CellGrid::from_strs(&[
            &["年月別", "件數", "面積"],
            &["113年", "", ""],
            &["一月", "10", "20"],
            &["二月", "11", "21"],
        ]);
        let layout = detect(&grid).unwrap();
        assert!(!layout.transpose);
        assert_eq!(layout.date_column, 0);
        assert_eq!(layout.data_start, 1);
    }

    #[test]
    fn test_large_counts_are_not_a_date_column() {
        let grid = CellGrid::from_strs(&[
            &["年月別", "件數"],
            &["113年", ""],
            &["一月", "12345"],
            &["二月", "23456"],
            &["114年", ""],
            &["一月", "12345"],
        ]);
        let layout = detect(&grid).unwrap();
        assert!(!layout.transpose);
        assert_eq!(layout.date_column, 0);
        assert_eq!(layout.header_rows, vec![0]);
    }

    #[test]
    fn test_decimal_values_under_dated_headers_transpose() {
        let grid = CellGrid::from_strs(&[
            &["項目", "2024-01", "2024-02", "2024-03"],
            &["", "1234.5", "1234.5", "1234.5"],
            &["", "2345.6", "2345.6", "2345.6"],
        ]);
        let layout = detect(&grid).unwrap();
        assert!(layout.transpose);
        assert_eq!(layout.header_rows, vec![0]);
        assert_eq!(layout.data_start, 1);
    }

    #[test]
    fn test_growth_rate_header_is_not_a_period() {
        let grid = CellGrid::from_strs(&[
            &["年月", "件數", "年增率"],
            &["113年", "", ""],
            &["一月", "10", "2.1"],
            &["二月", "11", "2.3"],
            &["114年", "", ""],
            &["一月", "12", "-0.5"],
        ]);
        let layout = detect(&grid).unwrap();
        assert!(!layout.transpose);
        assert_eq!(layout.header_rows, vec![0]);
        assert_eq!(layout.data_start, 1);
        assert_eq!(layout.date_column, 0);
    }

    #[test]
    fn test_period_headers() {
        assert!(looks_like_period("2024-01"));
        assert!(looks_like_period("113年 1月"));
        assert!(looks_like_period("移轉登記 3月"));
        assert!(!looks_like_period("年增率"));
        assert!(!looks_like_period("年月 件數"));
        assert!(!looks_like_period("1234.5"));
    }

    #[test]
    fn test_month_row_over_labels_is_not_transposed() {
        // small values in a month-labelled sheet look like a month header row
        let grid = CellGrid::from_strs(&[
            &["月別", "甲", "乙", "丙"],
            &["一月", "10", "11", "12"],
            &["二月", "1", "2", "3"],
        ]);
        assert_eq!(detect(&grid).unwrap_err().kind(), "layout");
    }

    #[test]
    fn test_undetectable_grid_fails() {
        let grid = CellGrid::from_strs(&[&["名稱", "說明"], &["甲", "乙"], &["丙", "丁"]]);
        let err = detect(&grid).unwrap_err();
        assert_eq!(err.kind(), "layout");
        assert!(detect(&CellGrid::default()).is_err());
    }

    #[test]
    fn test_combine_fragments() {
        let parts = ["移轉登記", "", "  買賣\u{3000}Sale  "];
        assert_eq!(combine_fragments(parts.into_iter()), "移轉登記 買賣 Sale");
    }
}
