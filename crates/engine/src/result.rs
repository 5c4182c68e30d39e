use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::Error;
use strategy::Verdict;

/// Why an instrument produced no verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// The provider could not supply a series.
    Fetch { message: String },
    MalformedSeries { index: usize, detail: String },
    InsufficientHistory { available: usize, required: usize },
    Config { message: String },
}

impl FailureReason {
    /// Record a provider error. The provider's own message is kept as-is.
    pub fn fetch(err: Error) -> Self {
        match err {
            Error::Fetch { message, .. } => FailureReason::Fetch { message },
            other => FailureReason::Fetch {
                message: other.to_string(),
            },
        }
    }
}

impl From<Error> for FailureReason {
    /// Map an evaluation error onto its failure class.
    fn from(err: Error) -> Self {
        match err {
            Error::MalformedSeries { index, detail, .. } => {
                FailureReason::MalformedSeries { index, detail }
            }
            Error::InsufficientHistory {
                available,
                required,
                ..
            } => FailureReason::InsufficientHistory {
                available,
                required,
            },
            Error::Fetch { message, .. } => FailureReason::Fetch { message },
            Error::Config(message) => FailureReason::Config { message },
            other => FailureReason::Config {
                message: other.to_string(),
            },
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::Fetch { message } => write!(f, "fetch failed: {message}"),
            FailureReason::MalformedSeries { index, detail } => {
                write!(f, "malformed series at bar {index}: {detail}")
            }
            FailureReason::InsufficientHistory {
                available,
                required,
            } => write!(f, "insufficient history: {available} of {required} bars"),
            FailureReason::Config { message } => write!(f, "configuration: {message}"),
        }
    }
}

/// Everything a batch run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub run_id: Uuid,
    /// One per successfully evaluated instrument, sorted by instrument id.
    pub verdicts: Vec<Verdict>,
    pub failures: BTreeMap<String, FailureReason>,
    /// Distinct instruments requested, including any skipped by cancellation.
    pub total_requested: usize,
    pub cancelled: bool,
}

impl BatchResult {
    pub fn succeeded(&self) -> usize {
        self.verdicts.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn emitted(&self) -> usize {
        self.verdicts.iter().filter(|v| v.emitted).count()
    }

    /// Requested instruments that were never started.
    pub fn skipped(&self) -> usize {
        self.total_requested
            .saturating_sub(self.succeeded() + self.failed())
    }

    /// Emitted verdicts only, in instrument order.
    pub fn signals(&self) -> impl Iterator<Item = &Verdict> {
        self.verdicts.iter().filter(|v| v.emitted)
    }
}
