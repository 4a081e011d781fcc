use crate::payload::Payload;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Retry policy for activities and sub-workflows.
///
/// Not named in the closed `EventType` set but referenced by
/// `ActivityScheduled`/`SubWorkflowScheduled` attributes; shape follows the
/// original SDK's `RetryOptions` (`max_attempts`, an initial backoff, a
/// coefficient, and a ceiling).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub first_interval_ms: i64,
    pub backoff_coefficient: f64,
    pub max_interval_ms: i64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            first_interval_ms: 1_000,
            backoff_coefficient: 2.0,
            max_interval_ms: 60_000,
        }
    }
}

/// Metadata carried alongside workflow/activity/sub-workflow scheduling
/// attributes (tracing context, idempotency markers, ...). Opaque to the
/// executor.
pub type Metadata = std::collections::BTreeMap<String, String>;

/// The closed set of 17 history event types (spec.md §3).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EventType {
    WorkflowExecutionStarted {
        name: String,
        inputs: Payload,
        metadata: Metadata,
    },
    WorkflowExecutionFinished {
        result: Option<Payload>,
        error: Option<String>,
    },
    WorkflowExecutionCanceled,
    WorkflowExecutionTerminated,
    WorkflowTaskStarted,
    WorkflowTaskFinished,
    ActivityScheduled {
        name: String,
        inputs: Payload,
        metadata: Metadata,
        retry_policy: Option<RetryPolicy>,
    },
    ActivityCompleted {
        result: Payload,
    },
    ActivityFailed {
        reason: String,
    },
    TimerScheduled {
        at: DateTime<Utc>,
    },
    TimerFired {
        at: DateTime<Utc>,
    },
    TimerCanceled,
    SignalReceived {
        name: String,
        arg: Payload,
    },
    SideEffectResult {
        result: Payload,
    },
    SubWorkflowScheduled {
        child_instance: String,
        name: String,
        inputs: Payload,
        metadata: Metadata,
    },
    SubWorkflowCompleted {
        result: Option<Payload>,
        error: Option<String>,
    },
    SubWorkflowCancellationRequested {
        child_instance: String,
    },
}

impl EventType {
    /// Returns the variant name as a static string for error messages and
    /// logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::WorkflowExecutionStarted { .. } => "WorkflowExecutionStarted",
            Self::WorkflowExecutionFinished { .. } => "WorkflowExecutionFinished",
            Self::WorkflowExecutionCanceled => "WorkflowExecutionCanceled",
            Self::WorkflowExecutionTerminated => "WorkflowExecutionTerminated",
            Self::WorkflowTaskStarted => "WorkflowTaskStarted",
            Self::WorkflowTaskFinished => "WorkflowTaskFinished",
            Self::ActivityScheduled { .. } => "ActivityScheduled",
            Self::ActivityCompleted { .. } => "ActivityCompleted",
            Self::ActivityFailed { .. } => "ActivityFailed",
            Self::TimerScheduled { .. } => "TimerScheduled",
            Self::TimerFired { .. } => "TimerFired",
            Self::TimerCanceled => "TimerCanceled",
            Self::SignalReceived { .. } => "SignalReceived",
            Self::SideEffectResult { .. } => "SideEffectResult",
            Self::SubWorkflowScheduled { .. } => "SubWorkflowScheduled",
            Self::SubWorkflowCompleted { .. } => "SubWorkflowCompleted",
            Self::SubWorkflowCancellationRequested { .. } => "SubWorkflowCancellationRequested",
        }
    }

    /// At-most-one of these may occur in a valid history (spec.md §8
    /// property 3).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::WorkflowExecutionFinished { .. }
                | Self::WorkflowExecutionCanceled
                | Self::WorkflowExecutionTerminated
        )
    }
}

/// A history event: a `JournalEntry`-like record with the fields spec.md
/// §3 requires for schedule/completion correlation and future (timer)
/// visibility.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEvent {
    /// Monotonic within the instance, 0-indexed.
    pub id: i64,
    /// Correlates a scheduled command to its completion event. Equal to
    /// `id` for the event that records the scheduling itself.
    pub schedule_event_id: i64,
    pub timestamp: DateTime<Utc>,
    /// Events with `visible_at > now` are future events (timers),
    /// delivered only when due.
    pub visible_at: Option<DateTime<Utc>>,
    pub event_type: EventType,
}

impl HistoryEvent {
    pub fn is_future(&self, now: DateTime<Utc>) -> bool {
        self.visible_at.map(|v| v > now).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_events_are_exactly_the_three_named() {
        let finished = EventType::WorkflowExecutionFinished {
            result: None,
            error: None,
        };
        let canceled = EventType::WorkflowExecutionCanceled;
        let terminated = EventType::WorkflowExecutionTerminated;
        let started = EventType::WorkflowTaskStarted;

        assert!(finished.is_terminal());
        assert!(canceled.is_terminal());
        assert!(terminated.is_terminal());
        assert!(!started.is_terminal());
    }

    #[test]
    fn is_future_compares_against_now() {
        let now = Utc::now();
        let event = HistoryEvent {
            id: 0,
            schedule_event_id: 0,
            timestamp: now,
            visible_at: Some(now + chrono::Duration::seconds(10)),
            event_type: EventType::TimerFired { at: now },
        };
        assert!(event.is_future(now));
        assert!(!event.is_future(now + chrono::Duration::seconds(20)));
    }
}
