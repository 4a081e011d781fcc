//! Error taxonomy (spec.md §7). Two-level shape mirroring
//! `workflow_journal`'s `JournalError`/`JournalViolation`: a coarse enum a
//! caller matches on, wrapping detailed, Display-friendly reasons.

use thiserror::Error;

use workflow_journal::JournalViolation;
use workflow_types::DomainError;

/// Fatal-to-this-task errors returned by [`crate::executor::WorkflowExecutor::execute_task`].
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// History says the workflow did X; current code wants Y. The backend
    /// may retry with a fresh executor or fail the instance.
    #[error("non-deterministic workflow: {0}")]
    NonDeterministic(String),

    /// The last replayed event id on a `Continuation` task does not match
    /// this executor's remembered `last_event_id`.
    #[error("history divergence: expected last event id {expected}, task starts after {actual}")]
    HistoryDivergence { expected: i64, actual: i64 },

    /// The submitted history prefix itself violates a structural/ordering
    /// invariant, independent of anything this executor remembers.
    #[error("invalid history: {0}")]
    InvalidHistory(JournalViolation),

    /// Workflow or activity name not registered.
    #[error("registry miss: {0}")]
    RegistryMiss(String),

    /// Input/output payload decode failure at a turn boundary (not inside a
    /// running future — that case surfaces to the waiting future instead).
    #[error("conversion error: {0}")]
    Conversion(#[from] DomainError),

    /// A `WorkflowTaskStarted`/`WorkflowExecutionStarted` event for a name
    /// the registry has never heard of, or any other internal-abort case.
    #[error("internal executor error: {0}")]
    Internal(String),
}
