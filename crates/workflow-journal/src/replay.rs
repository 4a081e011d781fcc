use std::collections::HashMap;

use workflow_types::{EventType, HistoryEvent, Payload};

/// Replay-time cached value for a resolved `schedule_event_id`.
#[derive(Clone, Debug, PartialEq)]
pub enum CachedResult {
    /// From `ActivityCompleted { result, .. }`.
    Activity(Payload),
    /// From `ActivityFailed { reason, .. }`.
    ActivityError(String),
    /// From `TimerFired { .. }`.
    Timer,
    /// From `SideEffectResult { result, .. }`.
    SideEffect(Payload),
    /// From `SubWorkflowCompleted { result: Some(_), .. }`.
    SubWorkflow(Payload),
    /// From `SubWorkflowCompleted { error: Some(_), .. }`.
    SubWorkflowError(String),
}

/// Batch-built replay cache keyed by `schedule_event_id`, the join point
/// between a command's pending future and its eventual resolving event
/// (spec.md §9 "pending-future table").
///
/// Construction is a single O(n) scan over history events.
#[derive(Clone, Debug, Default)]
pub struct ReplayCache {
    results: HashMap<i64, CachedResult>,
}

impl ReplayCache {
    pub fn build(entries: &[HistoryEvent]) -> Self {
        let mut results = HashMap::new();

        for entry in entries {
            let cached = match &entry.event_type {
                EventType::ActivityCompleted { result } => Some(CachedResult::Activity(result.clone())),
                EventType::ActivityFailed { reason } => Some(CachedResult::ActivityError(reason.clone())),
                EventType::TimerFired { .. } => Some(CachedResult::Timer),
                EventType::SideEffectResult { result } => Some(CachedResult::SideEffect(result.clone())),
                EventType::SubWorkflowCompleted { result: Some(r), .. } => {
                    Some(CachedResult::SubWorkflow(r.clone()))
                }
                EventType::SubWorkflowCompleted { error: Some(e), .. } => {
                    Some(CachedResult::SubWorkflowError(e.clone()))
                }
                _ => None,
            };
            if let Some(cached) = cached {
                results.insert(entry.schedule_event_id, cached);
            }
        }

        Self { results }
    }

    pub fn lookup(&self, schedule_event_id: i64) -> Option<&CachedResult> {
        self.results.get(&schedule_event_id)
    }

    pub fn is_timer_complete(&self, schedule_event_id: i64) -> bool {
        matches!(self.lookup(schedule_event_id), Some(CachedResult::Timer))
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
