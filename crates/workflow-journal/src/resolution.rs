use workflow_types::{EventType, HistoryEvent};

/// Returns true if an activity at `schedule_event_id` was ever scheduled.
/// Scan complexity: O(n).
pub fn is_activity_scheduled(entries: &[HistoryEvent], schedule_event_id: i64) -> bool {
    entries.iter().any(|e| {
        e.schedule_event_id == schedule_event_id
            && matches!(e.event_type, EventType::ActivityScheduled { .. })
    })
}

/// Returns true if a timer at `schedule_event_id` was ever scheduled.
/// Scan complexity: O(n).
pub fn is_timer_scheduled(entries: &[HistoryEvent], schedule_event_id: i64) -> bool {
    entries.iter().any(|e| {
        e.schedule_event_id == schedule_event_id
            && matches!(e.event_type, EventType::TimerScheduled { .. })
    })
}

/// Returns true if a sub-workflow at `schedule_event_id` was ever scheduled.
/// Scan complexity: O(n).
pub fn is_subworkflow_scheduled(entries: &[HistoryEvent], schedule_event_id: i64) -> bool {
    entries.iter().any(|e| {
        e.schedule_event_id == schedule_event_id
            && matches!(e.event_type, EventType::SubWorkflowScheduled { .. })
    })
}

/// Returns the first terminal event in history order, if present.
/// Scan complexity: O(n).
pub fn terminal_event(entries: &[HistoryEvent]) -> Option<&EventType> {
    entries.iter().find_map(|e| {
        if e.event_type.is_terminal() {
            Some(&e.event_type)
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use workflow_types::{Codec, Metadata, Payload};

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
    fn is_activity_scheduled_matches_by_schedule_event_id() {
        let entries = vec![entry(
            0,
            3,
            EventType::ActivityScheduled {
                name: "add".into(),
                inputs: Payload::new(vec![], Codec::Json),
                metadata: Metadata::new(),
                retry_policy: None,
            },
        )];
        assert!(is_activity_scheduled(&entries, 3));
        assert!(!is_activity_scheduled(&entries, 4));
    }

    #[test]
    fn terminal_event_finds_first_terminal() {
        let entries = vec![
            entry(0, 0, EventType::WorkflowTaskStarted),
            entry(
                1,
                1,
                EventType::WorkflowExecutionFinished {
                    result: None,
                    error: None,
                },
            ),
        ];
        assert!(terminal_event(&entries).is_some());
    }
}
