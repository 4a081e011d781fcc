//! Command → event translation (spec.md §4.C). A pure function mirroring
//! `original_source/internal/workflow/executor.go`'s `processCommands`
//! switch, arm for arm, generalized to the full `CommandAttrs` set
//! (including `CancelSubWorkflow`, which the original never implemented).

use chrono::{DateTime, Utc};

use workflow_types::{derive_execution_id, Command, CommandAttrs, EventType, WorkflowInstance};

/// A decision routed to a different instance than the one that produced it
/// (a new sub-workflow's start, a cancellation request, a parent's
/// completion notice) or scheduled to become visible in the future (a
/// timer fire). Never appended to the issuing instance's own history.
#[derive(Clone, Debug, PartialEq)]
pub struct OutboundEvent {
    pub target: WorkflowInstance,
    /// The `schedule_event_id` the delivering backend must stamp onto the
    /// `HistoryEvent` it builds from this outbound event, so the receiving
    /// executor's `apply_event` can look up the right pending command/
    /// future by id (spec.md §4.B "look up pending future by
    /// `schedule_event_id`"). Equal to the producing command's own id,
    /// except `SubWorkflowCompleted`, which carries the parent's
    /// `schedule_event_id` for the child it started (spec.md §4.C).
    pub schedule_event_id: i64,
    pub event_type: EventType,
    pub visible_at: Option<DateTime<Utc>>,
}

/// One event destined for the issuing instance's own history, alongside
/// the `schedule_event_id` that correlates it (equal to the command's id).
#[derive(Clone, Debug, PartialEq)]
pub struct OwnEvent {
    pub schedule_event_id: i64,
    pub event_type: EventType,
}

/// Translate a turn's committed commands into own-history events and
/// outbound events directed at other instances. Ordering is preserved:
/// this is the canonical serialization (spec.md §4.C).
pub fn harvest(commands: &[Command], instance: &WorkflowInstance) -> (Vec<OwnEvent>, Vec<OutboundEvent>) {
    let mut own = Vec::with_capacity(commands.len());
    let mut outbound = Vec::new();

    for command in commands {
        match &command.attrs {
            CommandAttrs::ScheduleActivity {
                name,
                inputs,
                metadata,
                retry_policy,
            } => {
                own.push(OwnEvent {
                    schedule_event_id: command.id,
                    event_type: EventType::ActivityScheduled {
                        name: name.clone(),
                        inputs: inputs.clone(),
                        metadata: metadata.clone(),
                        retry_policy: retry_policy.clone(),
                    },
                });
            }

            CommandAttrs::ScheduleTimer { at } => {
                own.push(OwnEvent {
                    schedule_event_id: command.id,
                    event_type: EventType::TimerScheduled { at: *at },
                });
                outbound.push(OutboundEvent {
                    target: instance.clone(),
                    schedule_event_id: command.id,
                    event_type: EventType::TimerFired { at: *at },
                    visible_at: Some(*at),
                });
            }

            CommandAttrs::CancelTimer => {
                own.push(OwnEvent {
                    schedule_event_id: command.id,
                    event_type: EventType::TimerCanceled,
                });
            }

            CommandAttrs::ScheduleSubWorkflow {
                child_instance_id,
                child_execution_id,
                name,
                inputs,
                metadata,
            } => {
                let child = WorkflowInstance {
                    instance_id: child_instance_id.clone(),
                    execution_id: child_execution_id.clone(),
                    parent: Some(workflow_types::ParentLink {
                        instance_id: instance.instance_id.clone(),
                        execution_id: instance.execution_id.clone(),
                        schedule_event_id: command.id,
                    }),
                };

                own.push(OwnEvent {
                    schedule_event_id: command.id,
                    event_type: EventType::SubWorkflowScheduled {
                        child_instance: child_instance_id.clone(),
                        name: name.clone(),
                        inputs: inputs.clone(),
                        metadata: metadata.clone(),
                    },
                });
                outbound.push(OutboundEvent {
                    target: child,
                    schedule_event_id: command.id,
                    event_type: EventType::WorkflowExecutionStarted {
                        name: name.clone(),
                        inputs: inputs.clone(),
                        metadata: metadata.clone(),
                    },
                    visible_at: None,
                });
            }

            CommandAttrs::CancelSubWorkflow {
                child_instance_id,
                child_execution_id,
            } => {
                own.push(OwnEvent {
                    schedule_event_id: command.id,
                    event_type: EventType::SubWorkflowCancellationRequested {
                        child_instance: child_instance_id.clone(),
                    },
                });
                outbound.push(OutboundEvent {
                    target: WorkflowInstance {
                        instance_id: child_instance_id.clone(),
                        execution_id: child_execution_id.clone(),
                        parent: Some(workflow_types::ParentLink {
                            instance_id: instance.instance_id.clone(),
                            execution_id: instance.execution_id.clone(),
                            schedule_event_id: command.id,
                        }),
                    },
                    schedule_event_id: command.id,
                    event_type: EventType::WorkflowExecutionCanceled,
                    visible_at: None,
                });
            }

            CommandAttrs::SideEffect { result } => {
                own.push(OwnEvent {
                    schedule_event_id: command.id,
                    event_type: EventType::SideEffectResult { result: result.clone() },
                });
            }

            CommandAttrs::CompleteWorkflow { result, error } => {
                own.push(OwnEvent {
                    schedule_event_id: command.id,
                    event_type: EventType::WorkflowExecutionFinished {
                        result: result.clone(),
                        error: error.clone(),
                    },
                });

                if let Some(parent) = &instance.parent {
                    outbound.push(OutboundEvent {
                        target: WorkflowInstance {
                            instance_id: parent.instance_id.clone(),
                            execution_id: parent.execution_id.clone(),
                            parent: None,
                        },
                        schedule_event_id: parent.schedule_event_id,
                        event_type: EventType::SubWorkflowCompleted {
                            result: result.clone(),
                            error: error.clone(),
                        },
                        visible_at: None,
                    });
                }
            }
        }
    }

    (own, outbound)
}

/// Deterministically mint a sub-workflow's child instance, for use by the
/// workflow-ctx layer when building a `ScheduleSubWorkflow` command (the
/// child identity must be fixed at command-creation time so replay derives
/// the same ids as the live run did).
pub fn mint_child_execution_id(parent: &WorkflowInstance, schedule_event_id: i64, name: &str) -> String {
    derive_execution_id(&parent.execution_id, schedule_event_id, name)
}
