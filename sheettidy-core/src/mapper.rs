//! Keyword mapping from raw headers to canonical column names

use serde::{Deserialize, Serialize};

use crate::tidy::{TidyRow, TidyTable, Value};

/// One canonical output column and the keywords that locate its source header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRule {
    pub canonical: String,
    /// At least one must appear; empty accepts any header
    #[serde(default)]
    pub any_of: Vec<String>,
    /// Every one must appear
    #[serde(default)]
    pub all_of: Vec<String>,
}

impl MappingRule {
    pub fn new(canonical: &str, any_of: &[&str]) -> Self {
        Self {
            canonical: canonical.to_string(),
            any_of: any_of.iter().map(|s| s.to_string()).collect(),
            all_of: Vec::new(),
        }
    }

    pub fn requiring(mut self, all_of: &[&str]) -> Self {
        self.all_of = all_of.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Case-insensitive substring match
    pub fn matches(&self, header: &str) -> bool {
        let header = header.to_lowercase();
        let any = self.any_of.is_empty()
            || self
                .any_of
                .iter()
                .any(|k| header.contains(&k.to_lowercase()));
        any && self
            .all_of
            .iter()
            .all(|k| header.contains(&k.to_lowercase()))
    }
}

/// Source column for each rule, in rule order; a header binds at most once
pub fn bind_columns(headers: &[String], rules: &[MappingRule]) -> Vec<Option<usize>> {
    let mut consumed = vec![false; headers.len()];
    rules
        .iter()
        .map(|rule| {
            let found = headers
                .iter()
                .enumerate()
                .find(|(i, h)| !consumed[*i] && rule.matches(h))
                .map(|(i, _)| i);
            if let Some(i) = found {
                consumed[i] = true;
            }
            found
        })
        .collect()
}

/// Reshape a table to exactly the canonical columns, Null where nothing matched
pub fn map_table(table: &TidyTable, rules: &[MappingRule], prefix: Option<&str>) -> TidyTable {
    let bindings = bind_columns(&table.columns, rules);
    for (rule, binding) in rules.iter().zip(&bindings) {
        match binding {
            Some(i) => tracing::debug!(
                "{}: {} <- {}",
                table.source,
                rule.canonical,
                table.columns[*i]
            ),
            None => tracing::debug!("{}: {} has no source column", table.source, rule.canonical),
        }
    }

    let prefix = prefix.unwrap_or("");
    let columns = rules
        .iter()
        .map(|r| format!("{}{}", prefix, r.canonical))
        .collect();
    let rows = table
        .rows
        .iter()
        .map(|row| TidyRow {
            date: row.date.clone(),
            values: bindings
                .iter()
                .map(|b| b.map_or(Value::Null, |i| row.values[i].clone()))
                .collect(),
        })
        .collect();

    TidyTable {
        source: table.source.clone(),
        columns,
        rows,
    }
}

/// Prepend a prefix to every value column
pub fn prefix_columns(mut table: TidyTable, prefix: &str) -> TidyTable {
    for column in &mut table.columns {
        column.insert_str(0, prefix);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: &[(&str, Vec<f64>)]) -> TidyTable {
        TidyTable {
            source: "test".to_string(),
            columns: columns.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|(d, v)| TidyRow {
                    date: d.to_string(),
                    values: v.iter().map(|n| Value::Number(*n)).collect(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_rule_matching() {
        let rule = MappingRule::new("商業類", &["商業", "Commerce"]).requiring(&["面積"]);
        assert!(rule.matches("商業類 B類 總樓地板面積"));
        assert!(rule.matches("COMMERCE floor 面積"));
        assert!(!rule.matches("商業類 件數"));
        assert!(MappingRule::new("any", &[]).matches("whatever"));
    }

    #[test]
    fn test_first_match_wins_and_consumes() {
        let headers: Vec<String> = ["件數 Cases", "總樓地板面積", "住宅 宅數", "住宅 總樓地板面積"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let rules = vec![
            MappingRule::new("總計_件數", &["件數"]),
            MappingRule::new("總計_總樓地板面積", &["總樓地板面積"]),
            MappingRule::new("住宅_宅數", &["宅數", "住宅"]),
            MappingRule::new("住宅_總樓地板面積", &["住宅", "總樓地板面積"]),
            MappingRule::new("商業_總樓地板面積", &["商業"]),
        ];
        assert_eq!(
            bind_columns(&headers, &rules),
            vec![Some(0), Some(1), Some(2), Some(3), None]
        );
    }

    #[test]
    fn test_map_table_schema_and_nulls() {
        let source = table(&["面積", "棟數"], &[("2024-01", vec![1.5, 2.0])]);
        let rules = vec![
            MappingRule::new("棟數", &["棟數"]),
            MappingRule::new("面積", &["面積"]),
            MappingRule::new("拍賣", &["拍賣"]),
        ];
        let mapped = map_table(&source, &rules, Some("所有權登記_"));
        assert_eq!(
            mapped.columns,
            vec!["所有權登記_棟數", "所有權登記_面積", "所有權登記_拍賣"]
        );
        assert_eq!(
            mapped.rows[0].values,
            vec![Value::Number(2.0), Value::Number(1.5), Value::Null]
        );
    }

    #[test]
    fn test_prefix_columns() {
        let prefixed = prefix_columns(table(&["a", "b"], &[]), "x_");
        assert_eq!(prefixed.columns, vec!["x_a", "x_b"]);
    }
}
