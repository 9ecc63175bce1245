//! Column naming from one or more header rows

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::layout::combine_fragments;
use crate::reader::CellGrid;

/// Prefix prepended to the headers of the listed columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderPrefix {
    pub prefix: String,
    pub columns: Vec<usize>,
}

/// Unique column names, one per grid column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderSpec {
    names: Vec<String>,
}

impl HeaderSpec {
    pub fn new(names: Vec<String>) -> Self {
        Self {
            names: dedupe(names),
        }
    }

    /// Combine the header rows column by column, decorating before de-duplication.
    ///
    /// `renamed` overrides the combined text for specific columns (the date
    /// column is always called `日期`).
    pub fn from_grid(
        grid: &CellGrid,
        header_rows: &[usize],
        suffix: Option<&str>,
        prefixes: &[HeaderPrefix],
        renamed: &[(usize, &str)],
    ) -> Self {
        let names = (0..grid.width())
            .map(|col| {
                if let Some((_, name)) = renamed.iter().find(|(c, _)| *c == col) {
                    return name.to_string();
                }
                let mut base =
                    combine_fragments(header_rows.iter().map(|&r| grid.cell(r, col)));
                if base.is_empty() {
                    base = format!("col{}", col);
                }
                let prefix = prefixes
                    .iter()
                    .find(|p| p.columns.contains(&col))
                    .map(|p| p.prefix.as_str())
                    .unwrap_or("");
                format!("{}{}{}", prefix, base, suffix.unwrap_or(""))
            })
            .collect();
        Self::new(names)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn get(&self, col: usize) -> Option<&str> {
        self.names.get(col).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Copy of the grid with merged header cells spread over the blank cells to
/// their right.
///
/// Header rows are filled top to bottom, and a span stops where a row above
/// starts a new group. Text never crosses into or out of a `barriers` column.
pub fn fill_merged(grid: &CellGrid, header_rows: &[usize], barriers: &[usize]) -> CellGrid {
    let mut rows: Vec<Vec<String>> = grid.rows().map(<[String]>::to_vec).collect();
    let mut group_starts = vec![false; grid.width()];

    for &r in header_rows {
        let Some(row) = rows.get_mut(r) else {
            continue;
        };
        let mut carried: Option<String> = None;
        for (col, cell) in row.iter_mut().enumerate() {
            let has_text = !cell.trim().is_empty();
            if barriers.contains(&col) {
                carried = None;
            } else if has_text {
                carried = Some(cell.clone());
            } else if group_starts[col] {
                carried = None;
            } else if let Some(text) = &carried {
                cell.clone_from(text);
            }
            group_starts[col] |= has_text;
        }
    }
    CellGrid::from_rows(rows)
}

/// Later repeats of a name get `_2`, `_3`, ... in order of appearance
pub fn dedupe(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut counters: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(names.len());

    for name in names {
        if seen.insert(name.clone()) {
            out.push(name);
            continue;
        }
        let counter = counters.entry(name.clone()).or_insert(1);
        loop {
            *counter += 1;
            let candidate = format!("{}_{}", name, counter);
            if seen.insert(candidate.clone()) {
                out.push(candidate);
                break;
            }
        }
    }

    out
}
