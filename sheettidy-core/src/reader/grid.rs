//! Untyped rectangular grid of string cells

/// A rectangular grid of string cells as read from a spreadsheet.
///
/// Ragged input rows are padded with empty strings up to the widest row, so
/// every row has exactly [`CellGrid::width`] cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellGrid {
    rows: Vec<Vec<String>>,
    width: usize,
}

impl CellGrid {
    pub fn from_rows(mut rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, String::new());
        }
        Self { rows, width }
    }

    /// Convenience constructor for literal grids
    pub fn from_strs(rows: &[&[&str]]) -> Self {
        Self::from_rows(
            rows.iter()
                .map(|row| row.iter().map(|cell| cell.to_string()).collect())
                .collect(),
        )
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.width == 0
    }

    /// Cell text, or "" outside the grid
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn row(&self, row: usize) -> &[String] {
        self.rows.get(row).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.iter().map(Vec::as_slice)
    }

    pub fn column(&self, col: usize) -> impl Iterator<Item = &str> {
        self.rows.iter().map(move |row| row.get(col).map(String::as_str).unwrap_or(""))
    }

    /// Flip rows and columns
    pub fn transpose(&self) -> CellGrid {
        let rows = (0..self.width)
            .map(|col| self.rows.iter().map(|row| row[col].clone()).collect())
            .collect();
        CellGrid {
            rows,
            width: self.rows.len(),
        }
    }

    /// True when every cell of the row is blank after trimming
    pub fn is_blank_row(&self, row: usize) -> bool {
        self.row(row).iter().all(|cell| cell.trim().is_empty())
    }
}
