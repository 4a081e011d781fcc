//! `WorkflowState` (spec.md §3, component B): per-instance mutable state
//! threaded through one turn. Grounded on `original_source/internal/workflow/state.go`'s
//! `workflowState` (`eventID` counter, `pendingFutures`, `commands`,
//! `replaying`, per-name signal channels) and the teacher's habit of keeping
//! this kind of bookkeeping as one plain struct rather than an actor.

use std::collections::HashMap;
use std::rc::Rc;

use chrono::{DateTime, Utc};

use workflow_sync::Channel;
use workflow_types::{Command, CommandAttrs, Payload};

/// A pending command's join point: the future-setter side lives in
/// `workflow-sync` as a [`workflow_sync::SharedFuture`], looked up here by
/// `schedule_event_id` (spec.md §9 "pending-future table").
pub struct PendingFuture {
    pub setter: Rc<workflow_sync::SharedFuture<Payload>>,
}

/// Per-instance mutable state, created once per executor and mutated for
/// the lifetime of the workflow (spec.md §3 "WorkflowState invariants").
pub struct WorkflowState {
    next_schedule_event_id: i64,
    pending_futures: HashMap<i64, PendingFuture>,
    commands: Vec<Command>,
    replaying: bool,
    time: DateTime<Utc>,
    signal_channels: HashMap<String, Rc<Channel<Payload>>>,
}

impl WorkflowState {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            next_schedule_event_id: 0,
            pending_futures: HashMap::new(),
            commands: Vec::new(),
            replaying: true,
            time: now,
            signal_channels: HashMap::new(),
        }
    }

    pub fn is_replaying(&self) -> bool {
        self.replaying
    }

    pub fn set_replaying(&mut self, replaying: bool) {
        self.replaying = replaying;
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    pub fn set_time(&mut self, time: DateTime<Utc>) {
        self.time = time;
    }

    /// Allocate and return the next `schedule_event_id`. Strictly monotonic
    /// and re-derived identically on replay, since replay reapplies the same
    /// sequence of command-issuing turns (spec.md §3).
    pub fn next_schedule_event_id(&mut self) -> i64 {
        let id = self.next_schedule_event_id;
        self.next_schedule_event_id += 1;
        id
    }

    /// Peek the id the next call to [`next_schedule_event_id`] will return,
    /// without consuming it. Used to deterministically mint a sub-workflow's
    /// child identity before the `ScheduleSubWorkflow` command itself is
    /// created (the command needs the minted id baked into its attrs).
    pub fn peek_next_schedule_event_id(&self) -> i64 {
        self.next_schedule_event_id
    }

    /// Record a new command emitted by the current turn, keyed by its own
    /// id for the pending-future join.
    pub fn add_command(&mut self, id: i64, attrs: CommandAttrs) {
        self.commands.push(Command::new(id, attrs));
    }

    pub fn register_pending_future(&mut self, schedule_event_id: i64, setter: Rc<workflow_sync::SharedFuture<Payload>>) {
        self.pending_futures
            .insert(schedule_event_id, PendingFuture { setter });
    }

    pub fn take_pending_future(&mut self, schedule_event_id: i64) -> Option<PendingFuture> {
        self.pending_futures.remove(&schedule_event_id)
    }

    /// Drain every still-outstanding pending future, regardless of id.
    /// Used on `WorkflowExecutionCanceled` so every suspended primitive
    /// (activity/timer/sub-workflow `Get`) resolves in the same turn the
    /// cancellation is applied (spec.md §8 "Cancellation completeness"),
    /// not just the ones explicitly racing against `CoopContext::done()`.
    pub fn take_all_pending_futures(&mut self) -> Vec<PendingFuture> {
        self.pending_futures.drain().map(|(_, v)| v).collect()
    }

    pub fn peek_pending_future(&self, schedule_event_id: i64) -> Option<&PendingFuture> {
        self.pending_futures.get(&schedule_event_id)
    }

    /// Find and remove the first command matching `schedule_event_id`, if
    /// any is still outstanding — mirrors `removeCommandByEventID` in the
    /// original executor, used when a scheduling event from history commits
    /// a command the current turn already produced.
    pub fn take_command(&mut self, schedule_event_id: i64) -> Option<Command> {
        let idx = self.commands.iter().position(|c| c.id == schedule_event_id)?;
        Some(self.commands.remove(idx))
    }

    /// Drain all commands accumulated during the turn just finished, ready
    /// for translation into history/outbound events.
    pub fn drain_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn commands_mut(&mut self) -> &mut [Command] {
        &mut self.commands
    }

    /// Look up (creating if absent) the named signal channel. Signal
    /// channels are lazily materialized by name (spec.md §9).
    pub fn signal_channel(&mut self, name: &str) -> Rc<Channel<Payload>> {
        self.signal_channels
            .entry(name.to_string())
            .or_insert_with(|| Rc::new(Channel::new(None)))
            .clone()
    }
}
