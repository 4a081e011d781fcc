use std::collections::HashSet;

use workflow_types::{AwaitKind, EventType, ExecutionStatus, HistoryEvent};

/// Returns the `schedule_event_id`s that resolve a blocked wait: activity
/// completions/failures, timer fires, and signal arrivals.
///
/// Intended use: after applying a batch of new events, compute this set once
/// and pass it to [`can_resume`] to decide whether the blocked workflow turn
/// may proceed.
pub fn wait_resolvers(entries: &[HistoryEvent]) -> HashSet<i64> {
    entries
        .iter()
        .filter_map(|e| match &e.event_type {
            EventType::ActivityCompleted { .. }
            | EventType::ActivityFailed { .. }
            | EventType::TimerFired { .. }
            | EventType::SubWorkflowCompleted { .. } => Some(e.schedule_event_id),
            _ => None,
        })
        .collect()
}

/// Returns whether a blocked execution can resume based on resolved
/// schedule-event-ids. Non-blocked statuses never resume via this path (the
/// scheduler run-queue, not history folding, drives their progress).
pub fn can_resume(status: &ExecutionStatus, resolved: &HashSet<i64>) -> bool {
    match status {
        ExecutionStatus::Blocked { waiting_on, kind } => match kind {
            AwaitKind::Single => waiting_on.iter().any(|id| resolved.contains(id)),
            AwaitKind::Signal { .. } => {
                debug_assert_eq!(
                    waiting_on.len(),
                    1,
                    "AwaitKind::Signal must have exactly one waiting_on id"
                );
                waiting_on.len() == 1 && resolved.contains(&waiting_on[0])
            }
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use workflow_types::{Codec, Payload};

    fn entry(id: i64, schedule_event_id: i64, event_type: EventType) -> HistoryEvent {
        HistoryEvent {
            id,
            schedule_event_id,
            timestamp: Utc::now(),
            visible_at: None,
            event_type,
        }
    }

    #[test]
    fn wait_resolvers_collects_completion_events_only() {
        let entries = vec![
            entry(
                0,
                0,
                EventType::ActivityCompleted {
                    result: Payload::new(vec![], Codec::Json),
                },
            ),
            entry(1, 1, EventType::TimerFired { at: Utc::now() }),
            entry(2, 2, EventType::WorkflowTaskStarted),
        ];
        let resolvers = wait_resolvers(&entries);
        assert!(resolvers.contains(&0));
        assert!(resolvers.contains(&1));
        assert!(!resolvers.contains(&2));
    }

    #[test]
    fn can_resume_single_await_resolves_when_present() {
        let status = ExecutionStatus::Blocked {
            waiting_on: vec![5],
            kind: AwaitKind::Single,
        };
        let mut resolved = HashSet::new();
        assert!(!can_resume(&status, &resolved));
        resolved.insert(5);
        assert!(can_resume(&status, &resolved));
    }

    #[test]
    fn can_resume_ignores_non_blocked_status() {
        let resolved: HashSet<i64> = [5].into_iter().collect();
        assert!(!can_resume(&ExecutionStatus::Running, &resolved));
    }
}
