//! Configuration system for source selection and per-source parameters

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use crate::dates::normalize_date;
use crate::error::{Result, TidyError};
use crate::sources::{SourceSpec, builtin_sources, get_all_valid_tokens};
use crate::tidy::YearPolicy;

/// Default file name looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "sheettidy.toml";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TidyConfig {
    #[serde(default)]
    pub global: GlobalConfig,
    #[serde(default)]
    pub sources: HashMap<String, SourceConfig>,
    /// Extra source definitions
    #[serde(default)]
    pub custom: Vec<SourceSpec>,
}

impl TidyConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| TidyError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| TidyError::Config(e.to_string()))
    }

    /// Check if a source is enabled globally
    pub fn is_source_enabled(&self, source: &SourceSpec) -> bool {
        if self
            .global
            .disabled_sources
            .iter()
            .any(|selector| matches_source_selector(selector, source))
        {
            return false;
        }

        if self.global.enabled_sources.is_empty() {
            return true;
        }

        self.global
            .enabled_sources
            .iter()
            .any(|selector| matches_source_selector(selector, source))
    }

    /// Validate selectors against known ids and agency prefixes, and check global params
    pub fn validate_sources(&self, valid_tokens: &HashSet<String>) -> Result<()> {
        for selector in &self.global.disabled_sources {
            if selector == "ALL" {
                return Err(TidyError::Config(
                    "'ALL' is not allowed in global disabled_sources".to_string(),
                ));
            }
            if !valid_tokens.contains(selector) {
                return Err(TidyError::Config(format!(
                    "Unknown source or agency '{}' in global disabled_sources",
                    selector
                )));
            }
        }

        for selector in &self.global.enabled_sources {
            if !valid_tokens.contains(selector) {
                return Err(TidyError::Config(format!(
                    "Unknown source or agency '{}' in global enabled_sources",
                    selector
                )));
            }
        }

        for id in self.sources.keys() {
            if !valid_tokens.contains(id) {
                return Err(TidyError::Config(format!(
                    "Unknown source '{}' in [sources]",
                    id
                )));
            }
        }

        if let Some(min_date) = self.get_param_str("min_date", None)
            && normalize_date(min_date).is_none()
        {
            return Err(TidyError::Config(format!(
                "min_date '{}' is not a year-month",
                min_date
            )));
        }

        Ok(())
    }

    /// Validate against the built-in sources plus the `[[custom]]` ones
    pub fn validate(&self) -> Result<()> {
        let mut known = builtin_sources();
        known.extend(self.custom.iter().cloned());
        self.validate_sources(&get_all_valid_tokens(&known))
    }

    /// Get a parameter value as string with fallback chain: source -> global
    pub fn get_param_str<'a>(&'a self, key: &str, source_id: Option<&str>) -> Option<&'a str> {
        if let Some(source) = source_id.and_then(|id| self.sources.get(id))
            && let Some(value) = source.params.get(key).and_then(|v| v.as_str())
        {
            return Some(value);
        }

        self.global.params.get(key).and_then(|v| v.as_str())
    }

    /// Get a parameter value as boolean with fallback chain: source -> global
    pub fn get_param_bool(&self, key: &str, source_id: Option<&str>) -> Option<bool> {
        if let Some(source) = source_id.and_then(|id| self.sources.get(id))
            && let Some(value) = source.params.get(key).and_then(|v| v.as_bool())
        {
            return Some(value);
        }

        self.global.params.get(key).and_then(|v| v.as_bool())
    }

    /// Get a parameter value as array with fallback chain: source -> global
    pub fn get_param_array(&self, key: &str, source_id: Option<&str>) -> Option<Vec<String>> {
        let as_strings = |v: &toml::Value| {
            v.as_array().map(|arr| {
                arr.iter()
                    .filter_map(|item| item.as_str().map(|s| s.to_string()))
                    .collect::<Vec<_>>()
            })
        };

        if let Some(source) = source_id.and_then(|id| self.sources.get(id))
            && let Some(arr) = source.params.get(key).and_then(as_strings)
        {
            return Some(arr);
        }

        self.global.params.get(key).and_then(as_strings)
    }

    /// Aggregation floor as `YYYY-MM`
    pub fn min_date(&self) -> Option<String> {
        self.get_param_str("min_date", None).and_then(normalize_date)
    }

    pub fn overwrite(&self) -> bool {
        self.get_param_bool("overwrite", None).unwrap_or(false)
    }

    /// Copy of a source with its configured overrides applied
    pub fn apply_overrides(&self, source: &SourceSpec) -> Result<SourceSpec> {
        let mut source = source.clone();
        let id = source.id.clone();

        if let Some(policy) = self.get_param_str("year_policy", Some(&id)) {
            source.year_policy = parse_year_policy(policy)?;
        }

        if let Some(params) = self.sources.get(&id).map(|s| &s.params) {
            if let Some(sheet) = params.get("sheet").and_then(|v| v.as_str()) {
                source.sheet = Some(sheet.to_string());
            }
            if let Some(suffix) = params.get("header_suffix").and_then(|v| v.as_str()) {
                source.header_suffix = Some(suffix.to_string());
            }
            if let Some(prefix) = params.get("output_prefix").and_then(|v| v.as_str()) {
                source.output_prefix = Some(prefix.to_string());
            }
            if params.contains_key("extensions")
                && let Some(extensions) = self.get_param_array("extensions", Some(&id))
            {
                source.extensions = extensions;
            }
        }

        Ok(source)
    }
}

fn parse_year_policy(value: &str) -> Result<YearPolicy> {
    match value {
        "strict" => Ok(YearPolicy::Strict),
        "filename-tag" => Ok(YearPolicy::FilenameTag),
        other => Err(TidyError::Config(format!(
            "year_policy must be 'strict' or 'filename-tag', got '{}'",
            other
        ))),
    }
}

/// Global configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Sources to run (empty means all)
    #[serde(default)]
    pub enabled_sources: HashSet<String>,
    /// Sources to skip
    #[serde(default)]
    pub disabled_sources: HashSet<String>,
    #[serde(flatten)]
    pub params: HashMap<String, toml::Value>,
}

/// Source-specific configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(flatten)]
    pub params: HashMap<String, toml::Value>,
}

fn matches_source_selector(selector: &str, source: &SourceSpec) -> bool {
    if selector == "ALL" {
        return true;
    }
    source.id == selector || source.id.starts_with(selector) || source.agency() == selector
}
