//! Structural invariants (S-1 through S-4).
//!
//! Enforce the physical integrity of the history as an append-only,
//! 0-indexed event log with well-defined lifecycle bookends. These run
//! before any domain-level checks since later invariants rely on structural
//! soundness (e.g. id == index).

use super::InvariantState;
use crate::error::JournalViolation;
use workflow_types::{EventType, HistoryEvent};

/// Validate structural invariants against the current accumulated state.
///
/// S-1 (id integrity) and S-2 (lifecycle start) are checked before
/// terminal-event rules (S-3/S-4), since the latter depend on coherent id
/// numbering. Within the terminal group, S-3 (duplicate terminal) takes
/// precedence over S-4 (post-terminal append).
pub(crate) fn check(state: &InvariantState, entry: &HistoryEvent) -> Result<(), JournalViolation> {
    debug_assert!(state.len <= i64::MAX as usize);
    let expected = state.len as i64;
    if entry.id != expected {
        return Err(JournalViolation::NonMonotonicId {
            entry_index: state.len,
            expected,
            actual: entry.id,
        });
    }

    if state.len == 0 && !matches!(entry.event_type, EventType::WorkflowExecutionStarted { .. }) {
        return Err(JournalViolation::MissingExecutionStarted {
            first_event: entry.event_type.name().to_string(),
        });
    }

    if let Some(first_at) = state.terminal_id {
        if entry.event_type.is_terminal() {
            return Err(JournalViolation::MultipleTerminalEvents {
                first_at,
                second_at: entry.id,
            });
        }
        return Err(JournalViolation::TerminalNotLast {
            terminal_id: first_at,
            history_len: state.len.saturating_add(1),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use workflow_types::{Codec, Payload};

    fn payload() -> Payload {
        Payload::new(vec![], Codec::Json)
    }

    fn mk_entry(id: i64, event_type: EventType) -> HistoryEvent {
        HistoryEvent {
            id,
            schedule_event_id: id,
            timestamp: Utc::now(),
            visible_at: None,
            event_type,
        }
    }

    fn started_event() -> EventType {
        EventType::WorkflowExecutionStarted {
            name: "w".into(),
            inputs: payload(),
            metadata: Default::default(),
        }
    }

    fn finished_event() -> EventType {
        EventType::WorkflowExecutionFinished {
            result: Some(payload()),
            error: None,
        }
    }

    #[test]
    fn s1_non_monotonic_id_reports_expected_actual() {
        let state = InvariantState {
            len: 1,
            ..Default::default()
        };
        let entry = mk_entry(0, started_event());

        let err = check(&state, &entry).unwrap_err();
        assert_eq!(
            err,
            JournalViolation::NonMonotonicId {
                entry_index: 1,
                expected: 1,
                actual: 0,
            }
        );
    }

    #[test]
    fn s2_first_event_must_be_execution_started() {
        let state = InvariantState::new();
        let entry = mk_entry(0, finished_event());

        let err = check(&state, &entry).unwrap_err();
        assert_eq!(
            err,
            JournalViolation::MissingExecutionStarted {
                first_event: "WorkflowExecutionFinished".to_string(),
            }
        );
    }

    #[test]
    fn s3_second_terminal_reports_multiple_terminal_events() {
        let state = InvariantState {
            len: 5,
            terminal_id: Some(3),
            ..Default::default()
        };
        let entry = mk_entry(5, EventType::WorkflowExecutionCanceled);

        let err = check(&state, &entry).unwrap_err();
        assert_eq!(
            err,
            JournalViolation::MultipleTerminalEvents {
                first_at: 3,
                second_at: 5,
            }
        );
    }

    #[test]
    fn s4_non_terminal_after_terminal_reports_terminal_not_last() {
        let state = InvariantState {
            len: 4,
            terminal_id: Some(3),
            ..Default::default()
        };
        let entry = mk_entry(4, EventType::WorkflowTaskStarted);

        let err = check(&state, &entry).unwrap_err();
        assert_eq!(
            err,
            JournalViolation::TerminalNotLast {
                terminal_id: 3,
                history_len: 5,
            }
        );
    }

    #[test]
    fn precedence_s1_over_s2_when_first_entry_has_wrong_id_and_event() {
        let state = InvariantState::new();
        let entry = mk_entry(42, finished_event());

        let err = check(&state, &entry).unwrap_err();
        assert!(matches!(err, JournalViolation::NonMonotonicId { .. }));
    }

    #[test]
    fn precedence_s3_over_s4_for_second_terminal() {
        let state = InvariantState {
            len: 6,
            terminal_id: Some(4),
            ..Default::default()
        };
        let entry = mk_entry(6, finished_event());

        let err = check(&state, &entry).unwrap_err();
        assert!(matches!(err, JournalViolation::MultipleTerminalEvents { .. }));
    }

    #[test]
    fn valid_first_execution_started_passes() {
        let state = InvariantState::new();
        let entry = mk_entry(0, started_event());

        assert!(check(&state, &entry).is_ok());
    }

    #[test]
    fn valid_non_terminal_before_any_terminal_passes() {
        let state = InvariantState {
            len: 1,
            ..Default::default()
        };
        let entry = mk_entry(1, EventType::WorkflowTaskStarted);

        assert!(check(&state, &entry).is_ok());
    }
}
