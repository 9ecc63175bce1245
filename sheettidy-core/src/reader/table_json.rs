//! Intermediate tables captured from HTML result pages
//!
//! Some portals only render their statistics as HTML tables. The capture step
//! stores them as `{"thead": [...], "tbody": [...]}` where each row is either
//! a list of cells or one comma-joined string.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use super::{CellGrid, GridReader, has_extension};

#[derive(Debug, Deserialize)]
pub struct CapturedTable {
    #[serde(default)]
    pub thead: Vec<CapturedRow>,
    #[serde(default)]
    pub tbody: Vec<CapturedRow>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CapturedRow {
    Cells(Vec<CapturedCell>),
    Joined(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CapturedCell {
    Text(String),
    Number(f64),
    Missing(Option<()>),
}

impl CapturedRow {
    fn into_cells(self) -> Vec<String> {
        match self {
            CapturedRow::Cells(cells) => cells.into_iter().map(CapturedCell::into_text).collect(),
            CapturedRow::Joined(line) => line.split(',').map(|s| s.trim().to_string()).collect(),
        }
    }
}

impl CapturedCell {
    fn into_text(self) -> String {
        match self {
            CapturedCell::Text(s) => s,
            CapturedCell::Number(n) => super::calamine_reader::render_float(n),
            CapturedCell::Missing(_) => String::new(),
        }
    }
}

impl CapturedTable {
    /// Header rows first, then body rows
    pub fn into_grid(self) -> CellGrid {
        let rows = self
            .thead
            .into_iter()
            .chain(self.tbody)
            .map(CapturedRow::into_cells)
            .collect();
        CellGrid::from_rows(rows)
    }
}

pub struct CapturedTableReader;

impl GridReader for CapturedTableReader {
    fn name(&self) -> &'static str {
        "captured-table"
    }

    fn accepts(&self, path: &Path) -> bool {
        has_extension(path, &["json"])
    }

    fn read(&self, path: &Path, _sheet: Option<&str>) -> Result<CellGrid> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        let table: CapturedTable =
            serde_json::from_str(&content).context("Invalid captured table JSON")?;
        Ok(table.into_grid())
    }
}
