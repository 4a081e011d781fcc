//! `WorkflowExecutor` (spec.md §4.B, component D): drives one workflow
//! instance's cooperative task through a single turn. Grounded arm-for-arm
//! on `original_source/internal/workflow/executor.go`'s `executor` struct
//! and `ExecuteTask`/`executeEvent` methods.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use tracing::{debug, instrument, trace};

use workflow_journal::validate_history;
use workflow_types::{CommandAttrs, ErrorKind, EventType, ExecutionError, HistoryEvent, Payload, WorkflowInstance};

use workflow_sync::{scheduler, CoopContext, LocalScheduler};

use crate::ctx::WorkflowCtx;
use crate::error::ExecutorError;
use crate::registry::Registry;
use crate::state::WorkflowState;
use crate::translate::{self, OutboundEvent};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskKind {
    /// Cold cache: replay `history_prefix` before processing `new_events`.
    First,
    /// Warm cache: assert continuity against `last_event_id`, skip replay.
    Continuation,
}

/// One unit of work delivered by the backend (spec.md §4.B).
pub struct WorkflowTask {
    pub instance: WorkflowInstance,
    pub history_prefix: Vec<HistoryEvent>,
    pub new_events: Vec<HistoryEvent>,
    pub kind: TaskKind,
    /// Wall-clock time as observed by the host layer. The deterministic
    /// core never reads the clock itself (spec.md §5); this is the one
    /// place real time enters, stamped onto the synthetic
    /// `WorkflowTaskStarted` event.
    pub now: DateTime<Utc>,
}

/// What one `execute_task` call produces: events to durably append to this
/// instance's own history, and events routed to other instances.
#[derive(Debug, Default)]
pub struct TurnOutput {
    pub new_history_events: Vec<HistoryEvent>,
    pub outbound_events: Vec<OutboundEvent>,
}

pub struct WorkflowExecutor {
    registry: Registry,
    instance: WorkflowInstance,
    state: Rc<RefCell<WorkflowState>>,
    coop: CoopContext,
    scheduler: Rc<LocalScheduler>,
    /// Id of the last `WorkflowTaskFinished` event this executor appended
    /// (spec.md §9 open question: defined as exactly this).
    last_event_id: Option<i64>,
    next_event_id: i64,
    root_result: Rc<RefCell<Option<Result<Payload, ExecutionError>>>>,
    span: tracing::Span,
}

impl WorkflowExecutor {
    pub fn new(registry: Registry, instance: WorkflowInstance, now: DateTime<Utc>) -> Self {
        let scheduler = LocalScheduler::new();
        let coop = CoopContext::new(scheduler.clone());
        let span = tracing::info_span!("workflow_instance", instance_id = %instance.instance_id, execution_id = %instance.execution_id);
        Self {
            registry,
            state: Rc::new(RefCell::new(WorkflowState::new(now))),
            coop,
            scheduler,
            instance,
            last_event_id: None,
            next_event_id: 0,
            root_result: Rc::new(RefCell::new(None)),
            span,
        }
    }

    pub fn instance(&self) -> &WorkflowInstance {
        &self.instance
    }

    /// Cancel the root cooperative context and drain the scheduler, so
    /// every suspended task resolves with `Canceled` and releases its
    /// references (spec.md §4.E "executor.Close()").
    pub fn close(&mut self) {
        self.coop.cancel();
        scheduler::run_until_stalled(&self.scheduler);
    }

    #[instrument(skip_all, fields(instance_id = %self.instance.instance_id, kind = ?task.kind))]
    pub fn execute_task(&mut self, task: WorkflowTask) -> Result<TurnOutput, ExecutorError> {
        let _entered = self.span.clone().entered();

        match task.kind {
            TaskKind::First => {
                if !task.history_prefix.is_empty() {
                    let violations = validate_history_prefix(&task.history_prefix);
                    if let Some(violation) = violations.into_iter().next() {
                        return Err(ExecutorError::InvalidHistory(violation));
                    }
                }
                self.next_event_id = task.history_prefix.last().map(|e| e.id + 1).unwrap_or(0);
                self.state.borrow_mut().set_replaying(true);
                for event in &task.history_prefix {
                    self.apply_event(event)?;
                }
            }
            TaskKind::Continuation => {
                let actual = task.history_prefix.last().map(|e| e.id);
                if let Some(expected) = self.last_event_id {
                    if actual != Some(expected) {
                        return Err(ExecutorError::HistoryDivergence {
                            expected,
                            actual: actual.unwrap_or(-1),
                        });
                    }
                }
                self.next_event_id = task.history_prefix.last().map(|e| e.id + 1).unwrap_or(self.next_event_id);
                self.state.borrow_mut().drain_commands();
            }
        }

        self.state.borrow_mut().set_replaying(false);

        // A genesis task (cold start, nothing replayed) delivers
        // `WorkflowExecutionStarted` as its first new event; it must land at
        // history position 0, ahead of `WorkflowTaskStarted`, since every
        // valid history starts with it (workflow-journal S-2). Every other
        // task synthesizes `WorkflowTaskStarted` first, matching the usual
        // "a task begins, then whatever woke it is applied" order.
        let is_genesis = matches!(task.kind, TaskKind::First) && task.history_prefix.is_empty();

        let mut produced = Vec::with_capacity(task.new_events.len() + 2);
        let mut pending_new_events = task.new_events;

        if is_genesis {
            let starts_with_genesis = pending_new_events
                .first()
                .map(|e| matches!(e.event_type, EventType::WorkflowExecutionStarted { .. }))
                .unwrap_or(false);
            if starts_with_genesis {
                let mut genesis = pending_new_events.remove(0);
                genesis.id = self.take_next_event_id();
                genesis.schedule_event_id = genesis.id;
                self.apply_event(&genesis)?;
                produced.push(genesis);
            }
        }

        let task_started = self.synthesize(EventType::WorkflowTaskStarted, task.now, None);
        self.apply_event(&task_started)?;
        produced.push(task_started);

        for mut event in pending_new_events {
            event.id = self.take_next_event_id();
            self.apply_event(&event)?;
            produced.push(event);
        }

        if let Some(result) = self.root_result.borrow_mut().take() {
            let (result_payload, error) = match result {
                Ok(payload) => (Some(payload), None),
                Err(err) => (None, Some(err.to_string())),
            };
            let mut state = self.state.borrow_mut();
            let id = state.next_schedule_event_id();
            state.add_command(
                id,
                CommandAttrs::CompleteWorkflow {
                    result: result_payload,
                    error,
                },
            );
        }

        let commands = self.state.borrow_mut().drain_commands();
        let (own_events, outbound_events) = translate::harvest(&commands, &self.instance);

        for own in own_events {
            let event = HistoryEvent {
                id: self.take_next_event_id(),
                schedule_event_id: own.schedule_event_id,
                timestamp: task.now,
                visible_at: None,
                event_type: own.event_type,
            };
            produced.push(event);
        }

        let task_finished = self.synthesize(EventType::WorkflowTaskFinished, task.now, None);
        self.last_event_id = Some(task_finished.id);
        produced.push(task_finished);

        debug!(events = produced.len(), outbound = outbound_events.len(), "turn complete");

        Ok(TurnOutput {
            new_history_events: produced,
            outbound_events,
        })
    }

    fn take_next_event_id(&mut self) -> i64 {
        let id = self.next_event_id;
        self.next_event_id += 1;
        id
    }

    fn synthesize(&mut self, event_type: EventType, timestamp: DateTime<Utc>, visible_at: Option<DateTime<Utc>>) -> HistoryEvent {
        let id = self.take_next_event_id();
        HistoryEvent {
            id,
            schedule_event_id: id,
            timestamp,
            visible_at,
            event_type,
        }
    }

    fn spawn_root(&mut self, name: &str, inputs: Payload) -> Result<(), ExecutorError> {
        let workflow_fn = self
            .registry
            .lookup_workflow(name)
            .map_err(|e| ExecutorError::RegistryMiss(e.to_string()))?;
        let ctx = WorkflowCtx::new(self.coop.clone(), self.state.clone(), self.instance.clone());
        let root_result = self.root_result.clone();
        self.coop.spawn(async move {
            let result = workflow_fn(ctx, inputs).await;
            *root_result.borrow_mut() = Some(result);
        });
        Ok(())
    }

    /// `apply_event` dispatch table (spec.md §4.B). Always drains the
    /// scheduler to quiescence afterward — an event may unblock a task
    /// (direct completions) or let a freshly-replayed task reach its first
    /// suspension point (`WorkflowExecutionStarted`); draining after every
    /// event, not just the ones that obviously unblock something, keeps
    /// this one rule instead of two.
    fn apply_event(&mut self, event: &HistoryEvent) -> Result<(), ExecutorError> {
        trace!(event = event.event_type.name(), id = event.id, "apply_event");

        match &event.event_type {
            EventType::WorkflowExecutionStarted { name, inputs, .. } => {
                self.spawn_root(name, inputs.clone())?;
            }

            EventType::WorkflowTaskStarted => {
                self.state.borrow_mut().set_time(event.timestamp);
            }

            EventType::ActivityScheduled { name, .. } => {
                if let Some(cmd) = self.state.borrow_mut().take_command(event.schedule_event_id) {
                    if let CommandAttrs::ScheduleActivity { name: scheduled, .. } = &cmd.attrs {
                        if scheduled != name {
                            return Err(ExecutorError::NonDeterministic(format!(
                                "activity name mismatch at schedule_event_id {}: history has {:?}, workflow scheduled {:?}",
                                event.schedule_event_id, name, scheduled
                            )));
                        }
                    }
                }
            }

            EventType::TimerScheduled { .. } => {
                self.state.borrow_mut().take_command(event.schedule_event_id);
            }

            EventType::TimerCanceled => {
                if let Some(pending) = self.state.borrow_mut().take_pending_future(event.schedule_event_id) {
                    pending
                        .setter
                        .set(Err(ExecutionError::new(ErrorKind::Cancelled, "timer canceled")));
                }
            }

            EventType::SubWorkflowScheduled { name, .. } => {
                if let Some(cmd) = self.state.borrow_mut().take_command(event.schedule_event_id) {
                    if let CommandAttrs::ScheduleSubWorkflow { name: scheduled, .. } = &cmd.attrs {
                        if scheduled != name {
                            return Err(ExecutorError::NonDeterministic(format!(
                                "sub-workflow name mismatch at schedule_event_id {}: history has {:?}, workflow scheduled {:?}",
                                event.schedule_event_id, name, scheduled
                            )));
                        }
                    }
                }
            }

            EventType::SubWorkflowCancellationRequested { .. } => {}

            EventType::ActivityCompleted { result } => {
                self.resolve(event.schedule_event_id, Ok(result.clone()));
            }

            EventType::ActivityFailed { reason } => {
                self.resolve(
                    event.schedule_event_id,
                    Err(ExecutionError::new(ErrorKind::ActivityFailure, reason.clone())),
                );
            }

            EventType::TimerFired { .. } => {
                // Missing pending future: timer was already canceled. Silently
                // absorbed (spec.md §9 open question 2).
                self.resolve(event.schedule_event_id, Ok(Payload::new(Vec::new(), workflow_types::Codec::Json)));
            }

            EventType::SideEffectResult { result } => {
                self.resolve(event.schedule_event_id, Ok(result.clone()));
            }

            EventType::SubWorkflowCompleted { result, error } => {
                let outcome = match error {
                    Some(reason) => Err(ExecutionError::new(ErrorKind::ActivityFailure, reason.clone())),
                    None => Ok(result.clone().unwrap_or_else(|| Payload::new(Vec::new(), workflow_types::Codec::Json))),
                };
                self.resolve(event.schedule_event_id, outcome);
            }

            EventType::SignalReceived { name, arg } => {
                let channel = self.state.borrow_mut().signal_channel(name);
                let _ = channel.send_nonblocking(arg.clone());
            }

            EventType::WorkflowExecutionCanceled => {
                self.coop.cancel();
                // Resolve every still-suspended primitive with Cancelled in
                // this same turn (spec.md §8 "Cancellation completeness"),
                // not only the ones racing against `ctx.cancelled()`.
                let pending = self.state.borrow_mut().take_all_pending_futures();
                for p in pending {
                    p.setter
                        .set(Err(ExecutionError::new(ErrorKind::Cancelled, "workflow canceled")));
                }
            }

            EventType::WorkflowExecutionFinished { .. }
            | EventType::WorkflowExecutionTerminated
            | EventType::WorkflowTaskFinished => {}
        }

        scheduler::run_until_stalled(&self.scheduler);
        Ok(())
    }

    fn resolve(&mut self, schedule_event_id: i64, outcome: Result<Payload, ExecutionError>) {
        let pending = self.state.borrow_mut().take_pending_future(schedule_event_id);
        if let Some(pending) = pending {
            self.state.borrow_mut().take_command(schedule_event_id);
            pending.setter.set(outcome);
        }
    }
}

fn validate_history_prefix(events: &[HistoryEvent]) -> Vec<workflow_journal::JournalViolation> {
    let journal = workflow_types::ExecutionJournal {
        execution_id: String::new(),
        entries: events.to_vec(),
    };
    validate_history(&journal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::LocalBoxFuture;
    use workflow_types::{Converter, JsonConverter};

    fn add_workflow() -> crate::registry::WorkflowFn {
        Rc::new(|ctx: WorkflowCtx, input: Payload| -> LocalBoxFuture<'static, Result<Payload, ExecutionError>> {
            Box::pin(async move {
                let (a, b): (i64, i64) = JsonConverter
                    .from_payload(&input)
                    .map_err(|e| ExecutionError::new(ErrorKind::ConversionError, e.to_string()))?;
                let sum: i64 = ctx.execute_activity("add", &(a, b), None).await?;
                JsonConverter
                    .to_payload(&sum)
                    .map_err(|e| ExecutionError::new(ErrorKind::ConversionError, e.to_string()))
            })
        })
    }

    fn instance() -> WorkflowInstance {
        WorkflowInstance::root("wf-1", "exec-1")
    }

    fn started_event(now: DateTime<Utc>, inputs: Payload) -> HistoryEvent {
        HistoryEvent {
            id: 0,
            schedule_event_id: 0,
            timestamp: now,
            visible_at: None,
            event_type: EventType::WorkflowExecutionStarted {
                name: "add_workflow".into(),
                inputs,
                metadata: Default::default(),
            },
        }
    }

    #[test]
    fn s1_add_scenario_schedules_then_completes() {
        let mut registry = Registry::new();
        registry.register_workflow("add_workflow", add_workflow()).unwrap();
        let now = Utc::now();
        let inputs = JsonConverter.to_payload(&(35i64, 12i64)).unwrap();

        let mut executor = WorkflowExecutor::new(registry, instance(), now);

        let first = executor
            .execute_task(WorkflowTask {
                instance: instance(),
                history_prefix: Vec::new(),
                new_events: vec![started_event(now, inputs)],
                kind: TaskKind::First,
                now,
            })
            .unwrap();

        let scheduled = first
            .new_history_events
            .iter()
            .find(|e| e.event_type.name() == "ActivityScheduled")
            .expect("ActivityScheduled event");
        assert_eq!(scheduled.schedule_event_id, 0);

        let mut history = first.new_history_events.clone();
        let last_id = history.last().unwrap().id;

        let completion = HistoryEvent {
            id: last_id + 1,
            schedule_event_id: 0,
            timestamp: now,
            visible_at: None,
            event_type: EventType::ActivityCompleted {
                result: JsonConverter.to_payload(&47i64).unwrap(),
            },
        };

        let second = executor
            .execute_task(WorkflowTask {
                instance: instance(),
                history_prefix: history.clone(),
                new_events: vec![completion.clone()],
                kind: TaskKind::Continuation,
                now,
            })
            .unwrap();

        let finished = second
            .new_history_events
            .iter()
            .find(|e| e.event_type.name() == "WorkflowExecutionFinished")
            .expect("workflow finished");
        match &finished.event_type {
            EventType::WorkflowExecutionFinished { result, error } => {
                assert!(error.is_none());
                let value: i64 = JsonConverter.from_payload(result.as_ref().unwrap()).unwrap();
                assert_eq!(value, 47);
            }
            _ => unreachable!(),
        }

        history.push(completion);
        history.extend(second.new_history_events);
        assert_eq!(
            history.iter().filter(|e| e.event_type.is_terminal()).count(),
            1,
            "at most one terminal event"
        );
    }

    #[test]
    fn s7_nondeterminism_is_detected_on_name_mismatch() {
        fn mul_workflow() -> crate::registry::WorkflowFn {
            Rc::new(|ctx: WorkflowCtx, input: Payload| -> LocalBoxFuture<'static, Result<Payload, ExecutionError>> {
                Box::pin(async move {
                    let (a, b): (i64, i64) = JsonConverter.from_payload(&input).unwrap();
                    let product: i64 = ctx.execute_activity("mul", &(a, b), None).await?;
                    Ok(JsonConverter.to_payload(&product).unwrap())
                })
            })
        }

        let mut registry = Registry::new();
        registry.register_workflow("w", mul_workflow()).unwrap();
        let now = Utc::now();

        let history_prefix = vec![
            started_event(now, JsonConverter.to_payload(&(2i64, 3i64)).unwrap()),
            HistoryEvent {
                id: 1,
                schedule_event_id: 0,
                timestamp: now,
                visible_at: None,
                event_type: EventType::ActivityScheduled {
                    name: "add".into(),
                    inputs: JsonConverter.to_payload(&(2i64, 3i64)).unwrap(),
                    metadata: Default::default(),
                    retry_policy: None,
                },
            },
        ];
        // fix workflow name on the started event to "w"
        let mut history_prefix = history_prefix;
        if let EventType::WorkflowExecutionStarted { name, .. } = &mut history_prefix[0].event_type {
            *name = "w".to_string();
        }

        let mut executor = WorkflowExecutor::new(registry, instance(), now);
        let err = executor
            .execute_task(WorkflowTask {
                instance: instance(),
                history_prefix,
                new_events: Vec::new(),
                kind: TaskKind::First,
                now,
            })
            .unwrap_err();

        assert!(matches!(err, ExecutorError::NonDeterministic(_)));
    }

    #[test]
    fn s2_timer_scenario_schedules_then_fires() {
        fn sleepy_workflow() -> crate::registry::WorkflowFn {
            Rc::new(|ctx: WorkflowCtx, _input: Payload| -> LocalBoxFuture<'static, Result<Payload, ExecutionError>> {
                Box::pin(async move {
                    ctx.sleep(chrono::Duration::milliseconds(100)).await?;
                    JsonConverter
                        .to_payload(&"ok".to_string())
                        .map_err(|e| ExecutionError::new(ErrorKind::ConversionError, e.to_string()))
                })
            })
        }

        let mut registry = Registry::new();
        registry.register_workflow("sleepy", sleepy_workflow()).unwrap();
        let now = Utc::now();
        let inputs = JsonConverter.to_payload(&()).unwrap();

        let mut executor = WorkflowExecutor::new(registry, instance(), now);

        let first = executor
            .execute_task(WorkflowTask {
                instance: instance(),
                history_prefix: Vec::new(),
                new_events: vec![HistoryEvent {
                    id: 0,
                    schedule_event_id: 0,
                    timestamp: now,
                    visible_at: None,
                    event_type: EventType::WorkflowExecutionStarted {
                        name: "sleepy".into(),
                        inputs,
                        metadata: Default::default(),
                    },
                }],
                kind: TaskKind::First,
                now,
            })
            .unwrap();

        let scheduled = first
            .new_history_events
            .iter()
            .find(|e| e.event_type.name() == "TimerScheduled")
            .expect("TimerScheduled event");
        assert_eq!(scheduled.schedule_event_id, 0);

        let mut history = first.new_history_events.clone();
        let last_id = history.last().unwrap().id;
        let fired_at = now + chrono::Duration::milliseconds(100);

        // Derive schedule_event_id from the prior turn's own outbound event,
        // the way a real Backend would, rather than assuming it matches the
        // command id that produced it.
        let timer_fired_outbound = first
            .outbound_events
            .iter()
            .find(|e| e.event_type.name() == "TimerFired")
            .expect("ScheduleTimer must produce an outbound TimerFired");

        let fired = HistoryEvent {
            id: last_id + 1,
            schedule_event_id: timer_fired_outbound.schedule_event_id,
            timestamp: fired_at,
            visible_at: None,
            event_type: EventType::TimerFired { at: fired_at },
        };

        let second = executor
            .execute_task(WorkflowTask {
                instance: instance(),
                history_prefix: history.clone(),
                new_events: vec![fired.clone()],
                kind: TaskKind::Continuation,
                now: fired_at,
            })
            .unwrap();

        let finished = second
            .new_history_events
            .iter()
            .find(|e| e.event_type.name() == "WorkflowExecutionFinished")
            .expect("workflow finished");
        match &finished.event_type {
            EventType::WorkflowExecutionFinished { result, error } => {
                assert!(error.is_none());
                let value: String = JsonConverter.from_payload(result.as_ref().unwrap()).unwrap();
                assert_eq!(value, "ok");
            }
            _ => unreachable!(),
        }

        history.push(fired);
        history.extend(second.new_history_events);
        assert_eq!(history.iter().filter(|e| e.event_type.is_terminal()).count(), 1);
    }

    #[test]
    fn s5_signal_scenario_resumes_with_delivered_value() {
        fn signal_workflow() -> crate::registry::WorkflowFn {
            Rc::new(|ctx: WorkflowCtx, _input: Payload| -> LocalBoxFuture<'static, Result<Payload, ExecutionError>> {
                Box::pin(async move {
                    let v: i64 = ctx.receive_signal("go").await?;
                    JsonConverter
                        .to_payload(&v)
                        .map_err(|e| ExecutionError::new(ErrorKind::ConversionError, e.to_string()))
                })
            })
        }

        let mut registry = Registry::new();
        registry.register_workflow("signal_workflow", signal_workflow()).unwrap();
        let now = Utc::now();
        let inputs = JsonConverter.to_payload(&()).unwrap();

        let mut executor = WorkflowExecutor::new(registry, instance(), now);

        let first = executor
            .execute_task(WorkflowTask {
                instance: instance(),
                history_prefix: Vec::new(),
                new_events: vec![HistoryEvent {
                    id: 0,
                    schedule_event_id: 0,
                    timestamp: now,
                    visible_at: None,
                    event_type: EventType::WorkflowExecutionStarted {
                        name: "signal_workflow".into(),
                        inputs,
                        metadata: Default::default(),
                    },
                }],
                kind: TaskKind::First,
                now,
            })
            .unwrap();

        // Nothing schedules yet: the workflow is parked on receive_signal.
        assert!(first
            .new_history_events
            .iter()
            .all(|e| e.event_type.name() != "WorkflowExecutionFinished"));

        let mut history = first.new_history_events.clone();
        let last_id = history.last().unwrap().id;

        let signal = HistoryEvent {
            id: last_id + 1,
            schedule_event_id: last_id + 1,
            timestamp: now,
            visible_at: None,
            event_type: EventType::SignalReceived {
                name: "go".into(),
                arg: JsonConverter.to_payload(&7i64).unwrap(),
            },
        };

        let second = executor
            .execute_task(WorkflowTask {
                instance: instance(),
                history_prefix: history.clone(),
                new_events: vec![signal.clone()],
                kind: TaskKind::Continuation,
                now,
            })
            .unwrap();

        let finished = second
            .new_history_events
            .iter()
            .find(|e| e.event_type.name() == "WorkflowExecutionFinished")
            .expect("workflow finished");
        match &finished.event_type {
            EventType::WorkflowExecutionFinished { result, error } => {
                assert!(error.is_none());
                let value: i64 = JsonConverter.from_payload(result.as_ref().unwrap()).unwrap();
                assert_eq!(value, 7);
            }
            _ => unreachable!(),
        }

        history.push(signal);
        history.extend(second.new_history_events);
        assert_eq!(history.iter().filter(|e| e.event_type.is_terminal()).count(), 1);
    }

    #[test]
    fn cancellation_resolves_every_suspended_primitive_in_one_turn() {
        fn two_activities_workflow() -> crate::registry::WorkflowFn {
            Rc::new(|ctx: WorkflowCtx, _input: Payload| -> LocalBoxFuture<'static, Result<Payload, ExecutionError>> {
                Box::pin(async move {
                    let ctx2 = ctx.clone();
                    ctx.go(async move {
                        let _: Result<i64, _> = ctx2.execute_activity("b", &(), None).await;
                    });
                    let result: Result<i64, _> = ctx.execute_activity("a", &(), None).await;
                    match result {
                        Err(e) => Err(e),
                        Ok(v) => JsonConverter
                            .to_payload(&v)
                            .map_err(|e| ExecutionError::new(ErrorKind::ConversionError, e.to_string())),
                    }
                })
            })
        }

        let mut registry = Registry::new();
        registry.register_workflow("two", two_activities_workflow()).unwrap();
        let now = Utc::now();
        let inputs = JsonConverter.to_payload(&()).unwrap();

        let mut executor = WorkflowExecutor::new(registry, instance(), now);

        let first = executor
            .execute_task(WorkflowTask {
                instance: instance(),
                history_prefix: Vec::new(),
                new_events: vec![HistoryEvent {
                    id: 0,
                    schedule_event_id: 0,
                    timestamp: now,
                    visible_at: None,
                    event_type: EventType::WorkflowExecutionStarted {
                        name: "two".into(),
                        inputs,
                        metadata: Default::default(),
                    },
                }],
                kind: TaskKind::First,
                now,
            })
            .unwrap();

        let scheduled_count = first
            .new_history_events
            .iter()
            .filter(|e| e.event_type.name() == "ActivityScheduled")
            .count();
        assert_eq!(scheduled_count, 2, "both activities should be pending before cancel");

        let history = first.new_history_events.clone();
        let last_id = history.last().unwrap().id;

        let canceled = HistoryEvent {
            id: last_id + 1,
            schedule_event_id: last_id + 1,
            timestamp: now,
            visible_at: None,
            event_type: EventType::WorkflowExecutionCanceled,
        };

        let second = executor
            .execute_task(WorkflowTask {
                instance: instance(),
                history_prefix: history,
                new_events: vec![canceled],
                kind: TaskKind::Continuation,
                now,
            })
            .unwrap();

        let finished = second
            .new_history_events
            .iter()
            .find(|e| e.event_type.name() == "WorkflowExecutionFinished")
            .expect("canceled activity should unwind the root task to completion, in the same turn");
        match &finished.event_type {
            EventType::WorkflowExecutionFinished { result, error } => {
                assert!(result.is_none());
                assert!(error.as_ref().unwrap().contains("canceled"));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn close_cancels_and_drains() {
        let registry = Registry::new();
        let mut executor = WorkflowExecutor::new(registry, instance(), Utc::now());
        executor.close();
        assert!(executor.coop.is_cancelled());
    }
}
