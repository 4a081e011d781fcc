use serde::{Deserialize, Serialize};

use crate::event::{EventType, HistoryEvent};

/// Determines the wait-satisfaction condition for a blocked execution,
/// mirroring the selector/join semantics of the cooperative scheduler
/// (spec.md §4.A).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AwaitKind {
    /// Waiting on a single schedule-event-id.
    Single,
    /// Waiting on a named signal.
    Signal { name: String },
}

/// Derived execution status. Not stored independently — derived by folding
/// over history events. Only a handful of event types change status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Running,
    Blocked {
        waiting_on: Vec<i64>,
        kind: AwaitKind,
    },
    Completed,
    Failed,
    Canceled,
    Terminated,
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::Canceled | Self::Terminated
        )
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "Running"),
            Self::Blocked { .. } => write!(f, "Blocked"),
            Self::Completed => write!(f, "Completed"),
            Self::Failed => write!(f, "Failed"),
            Self::Canceled => write!(f, "Canceled"),
            Self::Terminated => write!(f, "Terminated"),
        }
    }
}

/// Folds a history into its current derived status. A small, total
/// function: any prefix of a valid history folds to some status.
pub fn derive_status(events: &[HistoryEvent]) -> ExecutionStatus {
    let mut status = ExecutionStatus::Running;
    for e in events {
        status = match &e.event_type {
            EventType::WorkflowExecutionFinished { error, .. } => {
                if error.is_some() {
                    ExecutionStatus::Failed
                } else {
                    ExecutionStatus::Completed
                }
            }
            EventType::WorkflowExecutionCanceled => ExecutionStatus::Canceled,
            EventType::WorkflowExecutionTerminated => ExecutionStatus::Terminated,
            _ => status,
        };
    }
    status
}

/// The full history for one execution. Persistence-level struct; version is
/// `entries.len()`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExecutionJournal {
    pub execution_id: String,
    pub entries: Vec<HistoryEvent>,
}

impl ExecutionJournal {
    pub fn new(execution_id: impl Into<String>) -> Self {
        Self {
            execution_id: execution_id.into(),
            entries: Vec::new(),
        }
    }

    pub fn status(&self) -> ExecutionStatus {
        derive_status(&self.entries)
    }

    pub fn next_event_id(&self) -> i64 {
        self.entries.last().map(|e| e.id + 1).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(id: i64, event_type: EventType) -> HistoryEvent {
        HistoryEvent {
            id,
            schedule_event_id: id,
            timestamp: Utc::now(),
            visible_at: None,
            event_type,
        }
    }

    #[test]
    fn empty_history_is_running() {
        assert_eq!(derive_status(&[]), ExecutionStatus::Running);
    }

    #[test]
    fn finished_without_error_is_completed() {
        let events = vec![entry(
            0,
            EventType::WorkflowExecutionFinished {
                result: None,
                error: None,
            },
        )];
        assert_eq!(derive_status(&events), ExecutionStatus::Completed);
    }

    #[test]
    fn finished_with_error_is_failed() {
        let events = vec![entry(
            0,
            EventType::WorkflowExecutionFinished {
                result: None,
                error: Some("boom".into()),
            },
        )];
        assert_eq!(derive_status(&events), ExecutionStatus::Failed);
    }

    #[test]
    fn next_event_id_continues_from_last_entry() {
        let mut journal = ExecutionJournal::new("exec-1");
        assert_eq!(journal.next_event_id(), 0);
        journal.entries.push(entry(0, EventType::WorkflowTaskStarted));
        journal.entries.push(entry(1, EventType::WorkflowTaskFinished));
        assert_eq!(journal.next_event_id(), 2);
    }
}
