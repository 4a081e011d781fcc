use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical category for a workflow/activity-level failure (spec.md §7's
/// taxonomy of kinds, not Rust types). Coarse-grained: used for policy
/// decisions (retry behavior) and as an observability dimension.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// History says the workflow did X; current code wants Y. Fatal for the
    /// task — the backend may retry with a fresh executor or fail the
    /// instance.
    NonDeterministic,
    /// The workflow or activity returned an application error.
    UserError,
    /// Operation was intentionally cancelled.
    Cancelled,
    /// Input/output payload decode failure — surfaced to the waiting future
    /// as an ordinary error, not fatal to the task.
    ConversionError,
    /// An activity's `reason` string, captured and becomes the future's
    /// error on the workflow side.
    ActivityFailure,
    /// Catch-all bucket when no specific category applies.
    Uncategorized,
}

/// Structured payload for execution failures: classify (`kind`) for
/// retry/policy decisions, render (`message`) for user-facing summaries,
/// enrich (`detail`) with optional low-level diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionError {
    pub kind: ErrorKind,
    pub message: String,
    pub detail: Option<String>,
}

impl ExecutionError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
        }
    }

    pub fn new_with_detail(
        kind: ErrorKind,
        message: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: Some(detail.into()),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)?;
        if let Some(ref detail) = self.detail {
            write!(f, " ({})", detail)?;
        }
        Ok(())
    }
}
