//! Cell value coercion

use serde::{Deserialize, Serialize};

use super::Value;

/// How value cells become typed values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Coercion {
    /// Strip units and separators, keep the number; anything else is Null
    #[default]
    Numeric,
    /// Clean numbers stay numbers, everything else stays text
    Infer,
}

/// Keep only `[0-9.-]` and parse; empty or unparsable results are `None`
pub fn clean_numeric(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Remove every whitespace character, U+3000 included
pub fn compact_text(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

pub fn coerce(raw: &str, mode: Coercion) -> Value {
    match mode {
        Coercion::Numeric => clean_numeric(raw).map_or(Value::Null, Value::Number),
        Coercion::Infer => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                Value::Null
            } else if let Ok(n) = trimmed.parse::<f64>()
                && n.is_finite()
            {
                Value::Number(n)
            } else {
                Value::Text(trimmed.to_string())
            }
        }
    }
}

/// Text cell with whitespace removed; empty text is Null
pub fn text_value(raw: &str) -> Value {
    let text = compact_text(raw);
    if text.is_empty() {
        Value::Null
    } else {
        Value::Text(text)
    }
}
