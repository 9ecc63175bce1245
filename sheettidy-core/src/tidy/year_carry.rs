//! Year tracking for tables that print the year once and then list months

use serde::{Deserialize, Serialize};

use crate::dates::{YearMonth, month_marker, parse_date, parse_full_date, year_cell, year_marker};
use crate::layout::is_total_row;

/// What to do with a month row seen before any year row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum YearPolicy {
    /// Drop the row
    #[default]
    Strict,
    /// Use the year of the file's 8-digit date tag, or drop the row without one
    FilenameTag,
}

/// How one date cell was classified during the row walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowDate {
    Empty,
    Total,
    Date(YearMonth),
    YearMarker(i32),
    Unresolved,
}

/// Carried year for one row walk
#[derive(Debug, Clone)]
pub struct YearCarry {
    current: Option<i32>,
    policy: YearPolicy,
    tag_year: Option<i32>,
}

impl YearCarry {
    pub fn new(policy: YearPolicy, tag_year: Option<i32>) -> Self {
        Self {
            current: None,
            policy,
            tag_year,
        }
    }

    pub fn current(&self) -> Option<i32> {
        self.current
    }

    /// Month resolved against the carried year, falling back per policy
    pub fn resolve_month(&self, month: u32) -> Option<YearMonth> {
        let year = self.current.or(match self.policy {
            YearPolicy::Strict => None,
            YearPolicy::FilenameTag => self.tag_year,
        })?;
        YearMonth::new(year, month)
    }

    /// Classify a single date cell, updating the carried year
    pub fn classify(&mut self, cell: &str) -> RowDate {
        let cell = cell.trim();
        if cell.is_empty() {
            return RowDate::Empty;
        }
        if is_total_row(cell) {
            return RowDate::Total;
        }
        if let Some(ym) = parse_full_date(cell) {
            self.current = Some(ym.year);
            return RowDate::Date(ym);
        }
        if let Some(year) = year_marker(cell) {
            self.current = Some(year);
            return RowDate::YearMarker(year);
        }
        if let Some(month) = month_marker(cell) {
            return self
                .resolve_month(month)
                .map_or(RowDate::Unresolved, RowDate::Date);
        }
        parse_date(cell).map_or(RowDate::Unresolved, RowDate::Date)
    }

    /// Year and month held in separate cells; a blank year cell keeps the carried year
    pub fn classify_split(&mut self, year: &str, month: &str) -> RowDate {
        let (year, month) = (year.trim(), month.trim());
        if year.is_empty() && month.is_empty() {
            return RowDate::Empty;
        }
        if is_total_row(year) {
            return RowDate::Total;
        }
        if let Some(y) = year_cell(year).or_else(|| year_marker(year)) {
            self.current = Some(y);
        }
        if month.is_empty() {
            return match self.current {
                Some(y) if !year.is_empty() => RowDate::YearMarker(y),
                _ => RowDate::Unresolved,
            };
        }
        match month_marker(month) {
            Some(m) => self
                .resolve_month(m)
                .map_or(RowDate::Unresolved, RowDate::Date),
            None => RowDate::Unresolved,
        }
    }
}
