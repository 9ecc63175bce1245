//! Per-source outcomes of a batch run

use serde::Serialize;
use std::path::PathBuf;

use crate::error::TidyError;
use crate::sources::SourceSpec;

/// What happened to one source
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeStatus {
    Written,
    SkippedExisting,
    Missing,
    Failed,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Written => "written",
            OutcomeStatus::SkippedExisting => "skipped-existing",
            OutcomeStatus::Missing => "missing",
            OutcomeStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceOutcome {
    pub id: String,
    pub label: String,
    pub agency: String,
    pub status: OutcomeStatus,
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    /// Failure class, see [`TidyError::kind`]
    pub kind: Option<&'static str>,
    pub message: Option<String>,
    pub rows: usize,
}

impl SourceOutcome {
    fn base(spec: &SourceSpec, status: OutcomeStatus) -> Self {
        Self {
            id: spec.id.clone(),
            label: spec.label.clone(),
            agency: spec.agency().to_string(),
            status,
            input: None,
            output: None,
            kind: None,
            message: None,
            rows: 0,
        }
    }

    pub fn written(spec: &SourceSpec, input: PathBuf, output: PathBuf, rows: usize) -> Self {
        Self {
            input: Some(input),
            output: Some(output),
            rows,
            ..Self::base(spec, OutcomeStatus::Written)
        }
    }

    pub fn skipped_existing(spec: &SourceSpec, input: PathBuf, output: PathBuf) -> Self {
        Self {
            input: Some(input),
            output: Some(output),
            ..Self::base(spec, OutcomeStatus::SkippedExisting)
        }
    }

    pub fn missing(spec: &SourceSpec) -> Self {
        let error = TidyError::NoInput {
            label: spec.label.clone(),
        };
        Self {
            kind: Some(error.kind()),
            message: Some(error.to_string()),
            ..Self::base(spec, OutcomeStatus::Missing)
        }
    }

    pub fn failed(spec: &SourceSpec, input: Option<PathBuf>, error: &TidyError) -> Self {
        Self {
            input,
            kind: Some(error.kind()),
            message: Some(error.to_string()),
            ..Self::base(spec, OutcomeStatus::Failed)
        }
    }
}

/// Outcomes in source registry order
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub folder: PathBuf,
    pub outcomes: Vec<SourceOutcome>,
}

impl RunSummary {
    pub fn count(&self, status: OutcomeStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    pub fn written(&self) -> usize {
        self.count(OutcomeStatus::Written)
    }

    pub fn failed(&self) -> usize {
        self.count(OutcomeStatus::Failed)
    }

    pub fn get(&self, id: &str) -> Option<&SourceOutcome> {
        self.outcomes.iter().find(|o| o.id == id)
    }
}
