//! Primary grid reader backed by calamine

use anyhow::{Context, Result};
use calamine::{Data, Range, Reader, Sheets, open_workbook_auto};
use std::path::Path;

use super::{CellGrid, GridReader, has_extension};

pub struct CalamineReader;

impl GridReader for CalamineReader {
    fn name(&self) -> &'static str {
        "calamine"
    }

    fn accepts(&self, path: &Path) -> bool {
        has_extension(path, &["xls", "xlsx", "xlsm", "xlsb", "ods"])
    }

    fn read(&self, path: &Path, sheet: Option<&str>) -> Result<CellGrid> {
        let mut workbook: Sheets<_> = open_workbook_auto(path)
            .with_context(|| format!("Failed to open workbook: {}", path.display()))?;

        let sheet_names = workbook.sheet_names();
        let selected = match sheet {
            Some(name) if sheet_names.iter().any(|s| s == name) => name.to_string(),
            Some(name) => {
                tracing::debug!(
                    "sheet '{}' not in {}, using the first sheet",
                    name,
                    path.display()
                );
                sheet_names
                    .first()
                    .cloned()
                    .context("Workbook has no sheets")?
            }
            None => sheet_names
                .first()
                .cloned()
                .context("Workbook has no sheets")?,
        };

        let range = workbook
            .worksheet_range(&selected)
            .with_context(|| format!("Failed to read sheet '{}'", selected))?;

        Ok(range_to_grid(&range))
    }
}

/// Copy a calamine range into a grid, keeping absolute positions from A1
fn range_to_grid(range: &Range<Data>) -> CellGrid {
    let Some((start_row, start_col)) = range.start() else {
        return CellGrid::default();
    };
    let (height, width) = range.get_size();
    let (start_row, start_col) = (start_row as usize, start_col as usize);

    let mut rows = vec![Vec::new(); start_row + height];
    for (rel_row, row) in range.rows().enumerate() {
        let cells = &mut rows[start_row + rel_row];
        cells.resize(start_col + width, String::new());
        for (rel_col, data) in row.iter().enumerate() {
            cells[start_col + rel_col] = render_cell(data);
        }
    }

    CellGrid::from_rows(rows)
}

/// Render a cell as the text a user would see, without numeric conversion
pub fn render_cell(data: &Data) -> String {
    match data {
        Data::Int(i) => i.to_string(),
        Data::Float(f) => render_float(*f),
        Data::String(s) => s.clone(),
        Data::Bool(true) => "TRUE".to_string(),
        Data::Bool(false) => "FALSE".to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| render_float(dt.as_f64())),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(_) | Data::Empty => String::new(),
    }
}

/// Integral floats lose the trailing ".0" that spreadsheets never display
pub fn render_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_cell() {
        assert_eq!(render_cell(&Data::Int(114)), "114");
        assert_eq!(render_cell(&Data::Float(202405.0)), "202405");
        assert_eq!(render_cell(&Data::Float(3.25)), "3.25");
        assert_eq!(render_cell(&Data::String("1,234".to_string())), "1,234");
        assert_eq!(render_cell(&Data::Bool(true)), "TRUE");
        assert_eq!(render_cell(&Data::Empty), "");
    }

    #[test]
    fn test_range_offset_is_kept() {
        let mut range = Range::new((1, 1), (2, 2));
        range.set_value((1, 1), Data::String("日期".to_string()));
        range.set_value((2, 2), Data::Float(1.5));
        let grid = range_to_grid(&range);
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.cell(1, 1), "日期");
        assert_eq!(grid.cell(2, 2), "1.5");
        assert_eq!(grid.cell(0, 0), "");
    }
}
