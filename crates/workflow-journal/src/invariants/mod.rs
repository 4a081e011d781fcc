//! History invariant checking engine.
//!
//! Two modes of validation:
//! - **Incremental** ([`InvariantState::check_append`]): O(1) per entry via
//!   auxiliary state. Used at append time to reject invalid entries before
//!   they hit the history.
//! - **Batch** ([`validate_history`]): O(n) full scan that collects all
//!   violations. Used for diagnostics and recovery.
//!
//! Invariants are grouped into four sub-modules:
//! - [`structural`] (S-1..S-4): event id numbering, lifecycle bookends,
//!   terminal uniqueness.
//! - [`activity`] (A-1..A-2): activity completion ordering.
//! - [`timer`] (T-1..T-2): timer fire/cancel consistency.
//! - [`subworkflow`] (W-1..W-2): sub-workflow completion/cancellation
//!   ordering.
//!
//! Each sub-module exposes a single
//! `check(&InvariantState, &HistoryEvent) -> Result<(), JournalViolation>`
//! function. Sub-modules are read-only over state; all mutations happen in
//! [`InvariantState::apply_entry`].

mod activity;
mod structural;
mod subworkflow;
mod timer;

use crate::error::JournalViolation;
use std::collections::HashSet;
use workflow_types::{EventType, ExecutionJournal, HistoryEvent};

/// Accumulated auxiliary state for O(1) incremental invariant checking.
#[derive(Clone, Debug, Default)]
pub struct InvariantState {
    /// Number of entries ingested so far. Used by S-1 (expected id == len).
    pub(crate) len: usize,

    /// Id of the first terminal event, if any. Used by S-3 and S-4.
    pub(crate) terminal_id: Option<i64>,

    /// `schedule_event_id`s from `ActivityScheduled` events. Checked by A-1.
    pub(crate) scheduled_activities: HashSet<i64>,
    /// `schedule_event_id`s already completed (`ActivityCompleted`/`ActivityFailed`). Checked by A-2.
    pub(crate) completed_activities: HashSet<i64>,

    /// `schedule_event_id`s from `TimerScheduled` events. Checked by T-1/T-2.
    pub(crate) scheduled_timers: HashSet<i64>,
    /// `schedule_event_id`s from `TimerFired` events. Checked by T-2 (a fired
    /// timer can no longer be canceled).
    pub(crate) fired_timers: HashSet<i64>,

    /// `schedule_event_id`s from `SubWorkflowScheduled` events. Checked by
    /// W-1/W-2.
    pub(crate) scheduled_subworkflows: HashSet<i64>,
}

impl InvariantState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and ingest a single history event (incremental path).
    pub fn check_append(&mut self, entry: &HistoryEvent) -> Result<(), JournalViolation> {
        structural::check(self, entry)?;
        activity::check(self, entry)?;
        timer::check(self, entry)?;
        subworkflow::check(self, entry)?;
        self.apply_entry(entry);
        Ok(())
    }

    /// Run all invariant groups, collecting up to one violation per group.
    /// Unlike [`check_append`], this does not short-circuit across groups.
    fn collect_entry_violations(&self, entry: &HistoryEvent, violations: &mut Vec<JournalViolation>) {
        if let Err(v) = structural::check(self, entry) {
            violations.push(v);
        }
        if let Err(v) = activity::check(self, entry) {
            violations.push(v);
        }
        if let Err(v) = timer::check(self, entry) {
            violations.push(v);
        }
        if let Err(v) = subworkflow::check(self, entry) {
            violations.push(v);
        }
    }

    /// Update auxiliary state after an entry passes validation (or is
    /// force-applied during batch validation). Centralized here so every
    /// state mutation is visible in one place.
    fn apply_entry(&mut self, entry: &HistoryEvent) {
        match &entry.event_type {
            EventType::WorkflowExecutionFinished { .. }
            | EventType::WorkflowExecutionCanceled
            | EventType::WorkflowExecutionTerminated => {
                self.terminal_id.get_or_insert(entry.id);
            }
            EventType::ActivityScheduled { .. } => {
                self.scheduled_activities.insert(entry.schedule_event_id);
            }
            EventType::ActivityCompleted { .. } | EventType::ActivityFailed { .. } => {
                self.completed_activities.insert(entry.schedule_event_id);
            }
            EventType::TimerScheduled { .. } => {
                self.scheduled_timers.insert(entry.schedule_event_id);
            }
            EventType::TimerFired { .. } => {
                self.fired_timers.insert(entry.schedule_event_id);
            }
            EventType::SubWorkflowScheduled { .. } => {
                self.scheduled_subworkflows.insert(entry.schedule_event_id);
            }
            _ => {}
        }
        self.len += 1;
    }
}

/// Batch-validate an entire history, returning all detected violations. An
/// empty history reports [`JournalViolation::MissingExecutionStarted`].
pub fn validate_history(journal: &ExecutionJournal) -> Vec<JournalViolation> {
    if journal.entries.is_empty() {
        return vec![JournalViolation::MissingExecutionStarted {
            first_event: "<empty>".to_string(),
        }];
    }

    let mut state = InvariantState::new();
    let mut violations = Vec::new();

    for entry in &journal.entries {
        state.collect_entry_violations(entry, &mut violations);
        state.apply_entry(entry);
    }

    violations
}
