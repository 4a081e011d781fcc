/// Describes a specific history invariant violation.
///
/// Grouped: Structural (S-1..S-4), Activity (A-1..A-2), Timer (T-1..T-2),
/// SubWorkflow (W-1..W-2).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JournalViolation {
    /// S-1: event ids must equal their 0-indexed position in the history.
    NonMonotonicId {
        entry_index: usize,
        expected: i64,
        actual: i64,
    },
    /// S-2: the first event in every history must be `WorkflowExecutionStarted`.
    MissingExecutionStarted { first_event: String },
    /// S-3: at most one terminal event per history.
    MultipleTerminalEvents { first_at: i64, second_at: i64 },
    /// S-4: a terminal event must be the last entry in the history.
    TerminalNotLast { terminal_id: i64, history_len: usize },

    /// A-1: `ActivityCompleted`/`ActivityFailed` requires a preceding
    /// `ActivityScheduled` at the same `schedule_event_id`.
    ActivityCompletionWithoutSchedule {
        schedule_event_id: i64,
        completed_at: i64,
    },
    /// A-2: at most one completion (`ActivityCompleted`/`ActivityFailed`)
    /// per `schedule_event_id`.
    ActivityCompletedTwice {
        schedule_event_id: i64,
        second_at: i64,
    },

    /// T-1: `TimerFired` requires a preceding `TimerScheduled` at the same
    /// `schedule_event_id`.
    TimerFiredWithoutSchedule {
        schedule_event_id: i64,
        fired_at: i64,
    },
    /// T-2: `TimerCanceled` requires a preceding `TimerScheduled` at the
    /// same `schedule_event_id` that has not already fired.
    TimerCanceledInvalid {
        schedule_event_id: i64,
        canceled_at: i64,
    },

    /// W-1: `SubWorkflowCompleted` requires a preceding
    /// `SubWorkflowScheduled` at the same `schedule_event_id`.
    SubWorkflowCompletionWithoutSchedule {
        schedule_event_id: i64,
        completed_at: i64,
    },
    /// W-2: `SubWorkflowCancellationRequested` requires a preceding
    /// `SubWorkflowScheduled` at the same `schedule_event_id`.
    SubWorkflowCancellationWithoutSchedule {
        schedule_event_id: i64,
        requested_at: i64,
    },
}

impl std::fmt::Display for JournalViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonMonotonicId { entry_index, expected, actual } => write!(
                f,
                "S-1: non-monotonic event id at index {entry_index}: expected {expected}, got {actual}"
            ),
            Self::MissingExecutionStarted { first_event } => write!(
                f,
                "S-2: first event must be WorkflowExecutionStarted, got {first_event}"
            ),
            Self::MultipleTerminalEvents { first_at, second_at } => write!(
                f,
                "S-3: multiple terminal events at id {first_at} and {second_at}"
            ),
            Self::TerminalNotLast { terminal_id, history_len } => write!(
                f,
                "S-4: terminal event at id {terminal_id} is not last (history len {history_len})"
            ),
            Self::ActivityCompletionWithoutSchedule { schedule_event_id, completed_at } => write!(
                f,
                "A-1: activity completion at id {completed_at} for schedule_event_id {schedule_event_id} without prior ActivityScheduled"
            ),
            Self::ActivityCompletedTwice { schedule_event_id, second_at } => write!(
                f,
                "A-2: activity for schedule_event_id {schedule_event_id} completed twice, second at id {second_at}"
            ),
            Self::TimerFiredWithoutSchedule { schedule_event_id, fired_at } => write!(
                f,
                "T-1: TimerFired at id {fired_at} for schedule_event_id {schedule_event_id} without prior TimerScheduled"
            ),
            Self::TimerCanceledInvalid { schedule_event_id, canceled_at } => write!(
                f,
                "T-2: TimerCanceled at id {canceled_at} for schedule_event_id {schedule_event_id} without a live TimerScheduled"
            ),
            Self::SubWorkflowCompletionWithoutSchedule { schedule_event_id, completed_at } => write!(
                f,
                "W-1: sub-workflow completion at id {completed_at} for schedule_event_id {schedule_event_id} without prior SubWorkflowScheduled"
            ),
            Self::SubWorkflowCancellationWithoutSchedule { schedule_event_id, requested_at } => write!(
                f,
                "W-2: SubWorkflowCancellationRequested at id {requested_at} for schedule_event_id {schedule_event_id} without prior SubWorkflowScheduled"
            ),
        }
    }
}

/// Errors produced by journal operations.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("history is empty")]
    EmptyHistory,
    #[error("invariant violation: {0}")]
    InvariantViolation(JournalViolation),
}
