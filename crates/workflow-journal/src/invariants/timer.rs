//! Timer lifecycle invariants (T-1, T-2).

use super::InvariantState;
use crate::error::JournalViolation;
use workflow_types::{EventType, HistoryEvent};

pub(crate) fn check(state: &InvariantState, entry: &HistoryEvent) -> Result<(), JournalViolation> {
    match &entry.event_type {
        EventType::TimerFired { .. } => {
            if !state.scheduled_timers.contains(&entry.schedule_event_id) {
                return Err(JournalViolation::TimerFiredWithoutSchedule {
                    schedule_event_id: entry.schedule_event_id,
                    fired_at: entry.id,
                });
            }
            Ok(())
        }
        EventType::TimerCanceled => {
            if !state.scheduled_timers.contains(&entry.schedule_event_id)
                || state.fired_timers.contains(&entry.schedule_event_id)
            {
                return Err(JournalViolation::TimerCanceledInvalid {
                    schedule_event_id: entry.schedule_event_id,
                    canceled_at: entry.id,
                });
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

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
    fn t1_fired_without_schedule_is_rejected() {
        let state = InvariantState::new();
        let e = entry(0, 0, EventType::TimerFired { at: Utc::now() });
        let err = check(&state, &e).unwrap_err();
        assert_eq!(
            err,
            JournalViolation::TimerFiredWithoutSchedule {
                schedule_event_id: 0,
                fired_at: 0,
            }
        );
    }

    #[test]
    fn t2_cancel_after_fire_is_rejected() {
        let state = InvariantState {
            scheduled_timers: [0].into_iter().collect(),
            fired_timers: [0].into_iter().collect(),
            ..Default::default()
        };
        let e = entry(2, 0, EventType::TimerCanceled);
        let err = check(&state, &e).unwrap_err();
        assert_eq!(
            err,
            JournalViolation::TimerCanceledInvalid {
                schedule_event_id: 0,
                canceled_at: 2,
            }
        );
    }

    #[test]
    fn valid_fire_after_schedule_passes() {
        let state = InvariantState {
            scheduled_timers: [0].into_iter().collect(),
            ..Default::default()
        };
        let e = entry(1, 0, EventType::TimerFired { at: Utc::now() });
        assert!(check(&state, &e).is_ok());
    }

    #[test]
    fn valid_cancel_before_fire_passes() {
        let state = InvariantState {
            scheduled_timers: [0].into_iter().collect(),
            ..Default::default()
        };
        let e = entry(1, 0, EventType::TimerCanceled);
        assert!(check(&state, &e).is_ok());
    }
}
