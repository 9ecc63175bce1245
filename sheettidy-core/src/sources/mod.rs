//! Per-source profiles for the government statistics portals
//!
//! Every source shares the same reader, layout detector and builder; what
//! differs between them is declared in a [`SourceSpec`].

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub mod dgbas;
pub mod ee520;
pub mod moea;
pub mod mof;
pub mod moi;
pub mod mol;
pub mod motc;
pub mod ndc;

use crate::error::{Result, TidyError};
use crate::layout::{self, LayoutDecision};
use crate::mapper::MappingRule;
use crate::reader::{CellGrid, has_extension};
use crate::tidy::{BuildOptions, Coercion, DateCells, HeaderPrefix, YearPolicy};

/// Marker in the names of normalized output files
pub const CORRECTED_MARKER: &str = "(修正)";

/// How header rows and the data region are located
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum LayoutSpec {
    #[default]
    Auto,
    Fixed {
        header_rows: Vec<usize>,
        data_start: usize,
    },
}

/// Declarative description of one source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
    pub id: String,
    #[serde(default)]
    pub agency: String,
    /// File name prefix, followed by `_YYYYMMDD`
    pub label: String,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub sheet: Option<String>,
    #[serde(default)]
    pub layout: LayoutSpec,
    #[serde(default)]
    pub date_cells: DateCells,
    #[serde(default)]
    pub year_policy: YearPolicy,
    #[serde(default)]
    pub text_columns: Vec<usize>,
    #[serde(default)]
    pub hierarchy_column: Option<usize>,
    #[serde(default)]
    pub required_columns: Vec<usize>,
    #[serde(default)]
    pub header_suffix: Option<String>,
    #[serde(default)]
    pub header_prefixes: Vec<HeaderPrefix>,
    #[serde(default)]
    pub merged_headers: bool,
    #[serde(default)]
    pub mapping: Vec<MappingRule>,
    #[serde(default)]
    pub output_prefix: Option<String>,
}

fn default_extensions() -> Vec<String> {
    vec!["xls".to_string(), "xlsx".to_string()]
}

impl SourceSpec {
    pub fn new(id: &str, agency: &str, label: &str) -> Self {
        Self {
            id: id.to_string(),
            agency: agency.to_string(),
            label: label.to_string(),
            extensions: default_extensions(),
            sheet: None,
            layout: LayoutSpec::Auto,
            date_cells: DateCells::Column,
            year_policy: YearPolicy::Strict,
            text_columns: Vec::new(),
            hierarchy_column: None,
            required_columns: Vec::new(),
            header_suffix: None,
            header_prefixes: Vec::new(),
            merged_headers: false,
            mapping: Vec::new(),
            output_prefix: None,
        }
    }

    pub fn with_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = extensions.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn with_sheet(mut self, sheet: &str) -> Self {
        self.sheet = Some(sheet.to_string());
        self
    }

    pub fn with_fixed_layout(mut self, header_rows: &[usize], data_start: usize) -> Self {
        self.layout = LayoutSpec::Fixed {
            header_rows: header_rows.to_vec(),
            data_start,
        };
        self
    }

    /// Agency prefix, taken from the id when not given
    pub fn agency(&self) -> &str {
        if !self.agency.is_empty() {
            return &self.agency;
        }
        let end = self
            .id
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(self.id.len());
        &self.id[..end]
    }

    /// Raw input for this source: `<label>_...` with an accepted extension, not yet corrected
    pub fn accepts(&self, file_name: &str) -> bool {
        let exts: Vec<&str> = self.extensions.iter().map(String::as_str).collect();
        file_name.starts_with(&format!("{}_", self.label))
            && !file_name.contains(CORRECTED_MARKER)
            && has_extension(Path::new(file_name), &exts)
    }

    /// Lexicographically last accepted file in the folder
    pub fn find_input(&self, folder: &Path) -> Result<Option<PathBuf>> {
        let entries = fs::read_dir(folder)
            .map_err(|e| TidyError::read(folder, format!("cannot list folder: {}", e)))?;

        let mut candidates: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| self.accepts(n))
            })
            .collect();
        candidates.sort();
        Ok(candidates.pop())
    }

    /// `<stem>(修正).xlsx` beside the input
    pub fn output_path(&self, input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.label);
        let stem = stem.strip_suffix(CORRECTED_MARKER).unwrap_or(stem);
        input.with_file_name(format!("{}{}.xlsx", stem, CORRECTED_MARKER))
    }

    pub fn layout_for(&self, grid: &CellGrid) -> Result<LayoutDecision> {
        match &self.layout {
            LayoutSpec::Auto => layout::detect(grid),
            LayoutSpec::Fixed {
                header_rows,
                data_start,
            } => {
                if *data_start >= grid.height() {
                    return Err(TidyError::layout(format!(
                        "data starts at row {} but the sheet has {} rows",
                        data_start,
                        grid.height()
                    )));
                }
                Ok(LayoutDecision::fixed(grid, header_rows.clone(), *data_start))
            }
        }
    }

    pub fn build_options(&self, tag_year: Option<i32>) -> BuildOptions {
        BuildOptions {
            source: self.label.clone(),
            year_policy: self.year_policy,
            tag_year,
            coercion: Coercion::Numeric,
            date_cells: self.date_cells.clone(),
            text_columns: self.text_columns.clone(),
            hierarchy_column: self.hierarchy_column,
            required_columns: self.required_columns.clone(),
            header_suffix: self.header_suffix.clone(),
            header_prefixes: self.header_prefixes.clone(),
            merged_headers: self.merged_headers,
        }
    }
}

/// Every built-in source, in processing order
pub fn builtin_sources() -> Vec<SourceSpec> {
    let mut sources = Vec::new();
    sources.extend(motc::sources());
    sources.extend(moea::sources());
    sources.extend(mof::sources());
    sources.extend(ndc::sources());
    sources.extend(dgbas::sources());
    sources.extend(moi::sources());
    sources.extend(ee520::sources());
    sources.extend(mol::sources());
    sources
}

/// Tokens accepted by source selectors: `ALL`, every id and every agency prefix
pub fn get_all_valid_tokens(sources: &[SourceSpec]) -> HashSet<String> {
    let mut tokens = HashSet::new();
    tokens.insert("ALL".to_string());
    for source in sources {
        tokens.insert(source.id.clone());
        tokens.insert(source.agency().to_string());
    }
    tokens
}
