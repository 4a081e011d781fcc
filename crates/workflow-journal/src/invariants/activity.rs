//! Activity lifecycle invariants (A-1, A-2).

use super::InvariantState;
use crate::error::JournalViolation;
use workflow_types::{EventType, HistoryEvent};

/// A-2 is checked before A-1: a second completion for an already-completed
/// schedule_event_id is more specific than "no schedule at all" when both
/// could technically apply (they can't in practice, since completing twice
/// implies a schedule existed, but the ordering keeps the two checks
/// independent of each other's preconditions).
pub(crate) fn check(state: &InvariantState, entry: &HistoryEvent) -> Result<(), JournalViolation> {
    match &entry.event_type {
        EventType::ActivityCompleted { .. } | EventType::ActivityFailed { .. } => {
            if state.completed_activities.contains(&entry.schedule_event_id) {
                return Err(JournalViolation::ActivityCompletedTwice {
                    schedule_event_id: entry.schedule_event_id,
                    second_at: entry.id,
                });
            }
            if !state.scheduled_activities.contains(&entry.schedule_event_id) {
                return Err(JournalViolation::ActivityCompletionWithoutSchedule {
                    schedule_event_id: entry.schedule_event_id,
                    completed_at: entry.id,
                });
            }
            Ok(())
        }
        _ => Ok(()),
    }
}
