//! Sub-workflow lifecycle invariants (W-1, W-2).

use super::InvariantState;
use crate::error::JournalViolation;
use workflow_types::{EventType, HistoryEvent};

pub(crate) fn check(state: &InvariantState, entry: &HistoryEvent) -> Result<(), JournalViolation> {
    match &entry.event_type {
        EventType::SubWorkflowCompleted { .. } => {
            if !state.scheduled_subworkflows.contains(&entry.schedule_event_id) {
                return Err(JournalViolation::SubWorkflowCompletionWithoutSchedule {
                    schedule_event_id: entry.schedule_event_id,
                    completed_at: entry.id,
                });
            }
            Ok(())
        }
        EventType::SubWorkflowCancellationRequested { .. } => {
            if !state.scheduled_subworkflows.contains(&entry.schedule_event_id) {
                return Err(JournalViolation::SubWorkflowCancellationWithoutSchedule {
                    schedule_event_id: entry.schedule_event_id,
                    requested_at: entry.id,
                });
            }
            Ok(())
        }
        _ => Ok(()),
    }
}
