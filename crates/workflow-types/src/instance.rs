use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Identifies where a sub-workflow was scheduled from: the parent instance,
/// its execution, and the schedule-event-id of the `ScheduleSubWorkflow`
/// command that created this link.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParentLink {
    pub instance_id: String,
    pub execution_id: String,
    pub schedule_event_id: i64,
}

/// `(instance_id, execution_id)` identifies one run of a workflow. Two
/// instances sharing an `instance_id` but not an `execution_id` are distinct
/// executions (a restart, a replay under test, ...). The sub-workflow
/// relation is immutable once the instance is created.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkflowInstance {
    pub instance_id: String,
    pub execution_id: String,
    pub parent: Option<ParentLink>,
}

impl WorkflowInstance {
    pub fn root(instance_id: impl Into<String>, execution_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            execution_id: execution_id.into(),
            parent: None,
        }
    }

    pub fn cache_key(&self) -> String {
        format!("{}-{}", self.instance_id, self.execution_id)
    }

    pub fn is_sub_workflow(&self) -> bool {
        self.parent.is_some()
    }
}

/// Deterministically derives the `execution_id` of a freshly scheduled
/// sub-workflow from its parent's execution and the schedule-event-id of the
/// command that created it, so that two executors replaying the same
/// history mint the same child identity without coordination.
pub fn derive_execution_id(parent_execution_id: &str, schedule_event_id: i64, name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(parent_execution_id.as_bytes());
    hasher.update(schedule_event_id.to_le_bytes());
    hasher.update(name.as_bytes());
    let digest: [u8; 32] = hasher.finalize().into();
    hex::encode(&digest[..16])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_joins_instance_and_execution() {
        let i = WorkflowInstance::root("wf-1", "exec-1");
        assert_eq!(i.cache_key(), "wf-1-exec-1");
    }

    #[test]
    fn derive_execution_id_is_deterministic() {
        let a = derive_execution_id("exec-1", 3, "child");
        let b = derive_execution_id("exec-1", 3, "child");
        assert_eq!(a, b);
    }

    #[test]
    fn derive_execution_id_differs_by_schedule_event_id() {
        let a = derive_execution_id("exec-1", 3, "child");
        let b = derive_execution_id("exec-1", 4, "child");
        assert_ne!(a, b);
    }
}
