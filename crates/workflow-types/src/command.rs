use serde::{Deserialize, Serialize};

use crate::event::{Metadata, RetryPolicy};
use crate::payload::Payload;

/// The attributes of a scheduling decision made by a workflow turn. One
/// variant per distinct kind of outstanding work (spec.md §4.C).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CommandAttrs {
    ScheduleActivity {
        name: String,
        inputs: Payload,
        metadata: Metadata,
        retry_policy: Option<RetryPolicy>,
    },
    ScheduleTimer {
        at: chrono::DateTime<chrono::Utc>,
    },
    CancelTimer,
    ScheduleSubWorkflow {
        child_instance_id: String,
        child_execution_id: String,
        name: String,
        inputs: Payload,
        metadata: Metadata,
    },
    CancelSubWorkflow {
        child_instance_id: String,
        child_execution_id: String,
    },
    SideEffect {
        result: Payload,
    },
    CompleteWorkflow {
        result: Option<Payload>,
        error: Option<String>,
    },
}

impl CommandAttrs {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ScheduleActivity { .. } => "ScheduleActivity",
            Self::ScheduleTimer { .. } => "ScheduleTimer",
            Self::CancelTimer => "CancelTimer",
            Self::ScheduleSubWorkflow { .. } => "ScheduleSubWorkflow",
            Self::CancelSubWorkflow { .. } => "CancelSubWorkflow",
            Self::SideEffect { .. } => "SideEffect",
            Self::CompleteWorkflow { .. } => "CompleteWorkflow",
        }
    }
}

/// A decision produced by a workflow turn, pending translation into history/
/// outbound events (`workflow_executor::translate::harvest`). `id` equals the
/// `schedule_event_id` of the event(s) it emits. Held in `WorkflowState`
/// until the turn's matching scheduling event is applied (see
/// `WorkflowState::take_command`), at which point it is removed — a command
/// that outlives its own turn without being taken back out by a completion
/// or scheduling event never becomes visible again.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub id: i64,
    pub attrs: CommandAttrs,
}

impl Command {
    pub fn new(id: i64, attrs: CommandAttrs) -> Self {
        Self { id, attrs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_command_carries_its_attrs() {
        let cmd = Command::new(1, CommandAttrs::CancelTimer);
        assert_eq!(cmd.attrs.name(), "CancelTimer");
    }
}
