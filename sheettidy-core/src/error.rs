//! Error taxonomy for reading, detecting, building and writing tidy tables

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TidyError>;

#[derive(Debug, Error)]
pub enum TidyError {
    /// Every reader strategy failed for this file
    #[error("cannot read {}: {reason}", path.display())]
    Read { path: PathBuf, reason: String },

    /// No plausible date column or header combination
    #[error("layout detection failed: {reason}")]
    LayoutDetection { reason: String },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("no input file found for '{label}'")]
    NoInput { label: String },
}

impl TidyError {
    pub(crate) fn read(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        TidyError::Read {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn layout(reason: impl Into<String>) -> Self {
        TidyError::LayoutDetection {
            reason: reason.into(),
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: impl Into<std::io::Error>) -> Self {
        TidyError::Write {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Short machine-readable name of the failure class
    pub fn kind(&self) -> &'static str {
        match self {
            TidyError::Read { .. } => "read",
            TidyError::LayoutDetection { .. } => "layout",
            TidyError::Write { .. } => "write",
            TidyError::Config(_) => "config",
            TidyError::NoInput { .. } => "no-input",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_message() {
        let err = TidyError::read("a/b.xlsx", "not a zip archive");
        assert_eq!(err.kind(), "read");
        assert_eq!(err.to_string(), "cannot read a/b.xlsx: not a zip archive");

        let err = TidyError::layout("no date-like column");
        assert_eq!(err.kind(), "layout");
        assert!(err.to_string().contains("no date-like column"));
    }
}
