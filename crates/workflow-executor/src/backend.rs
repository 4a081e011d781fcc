//! Backend contract (spec.md §6): the host-provided durability and
//! dispatch surface this crate consumes but never implements. Grounded on
//! `original_source/internal/backend/backend.go`'s `Backend` interface;
//! expressed here as an `async_trait` since the host layer is the
//! preemptive/async side of the two-layer model (spec.md §5), unlike the
//! single-threaded cooperative core the rest of this crate builds.

use std::time::Duration;

use async_trait::async_trait;

use workflow_types::{ExecutionJournal, HistoryEvent, Payload, WorkflowInstance};

use crate::executor::TurnOutput;

/// An exclusive lease on one instance's next workflow task, handed out by
/// [`Backend::get_workflow_task`]. Carries everything `WorkflowExecutor`
/// needs to resume: the instance identity, the durable history prefix, and
/// whatever new events triggered this task.
#[derive(Clone, Debug)]
pub struct WorkflowTaskLease {
    pub instance: WorkflowInstance,
    pub history_prefix: Vec<HistoryEvent>,
    pub new_events: Vec<HistoryEvent>,
}

/// An exclusive lease on one activity invocation.
#[derive(Clone, Debug)]
pub struct ActivityTaskLease {
    pub instance: WorkflowInstance,
    pub schedule_event_id: i64,
    pub name: String,
    pub inputs: Payload,
}

/// Outcome of one activity invocation, reported back via
/// [`Backend::complete_activity_task`].
#[derive(Clone, Debug)]
pub enum ActivityOutcome {
    Completed(Payload),
    Failed(String),
}

/// Current status of an instance as the backend understands it, for
/// [`Backend::get_workflow_instance_state`]. Distinct from
/// `workflow_types::ExecutionStatus`: this is the backend's own bookkeeping
/// (is a task currently leased, is the instance known at all), not a status
/// derived by folding history.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstanceState {
    Unknown,
    Running,
    Completed,
}

/// What the core consumes from durable storage and cross-instance dispatch
/// (spec.md §6). Implementations must provide at-least-once task delivery,
/// per-instance serialization (no two concurrent leases for one instance),
/// durable ordered history append, and future-event visibility scheduling —
/// none of which this crate can verify on its behalf.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn get_workflow_task(&self) -> Result<Option<WorkflowTaskLease>, BackendError>;

    /// Atomically append `output.new_history_events` to `task`'s instance,
    /// dispatch `output.outbound_events` to their target instances, and
    /// release the lease.
    async fn complete_workflow_task(&self, task: &WorkflowTaskLease, output: TurnOutput) -> Result<(), BackendError>;

    /// Heartbeat: extend the lease on `task` without completing it.
    async fn extend_workflow_task(&self, task: &WorkflowTaskLease) -> Result<(), BackendError>;

    async fn get_activity_task(&self) -> Result<Option<ActivityTaskLease>, BackendError>;

    async fn complete_activity_task(&self, task: &ActivityTaskLease, outcome: ActivityOutcome) -> Result<(), BackendError>;

    async fn extend_activity_task(&self, task: &ActivityTaskLease) -> Result<(), BackendError>;

    async fn signal_workflow(&self, instance_id: &str, name: &str, arg: Payload) -> Result<(), BackendError>;

    async fn cancel_workflow(&self, instance_id: &str) -> Result<(), BackendError>;

    async fn get_workflow_instance_state(&self, instance_id: &str) -> Result<InstanceState, BackendError>;

    async fn get_workflow_instance_history(&self, instance_id: &str) -> Result<ExecutionJournal, BackendError>;
}

/// Transient-by-default backend error (spec.md §7 "Transient I/O": workers
/// must back off and retry; never surfaced to the workflow itself).
#[derive(Debug, thiserror::Error)]
#[error("backend error: {0}")]
pub struct BackendError(pub String);

/// Recognized worker options (spec.md §6). Pollers and parallelism bounds
/// govern the host layer; the cache fields size and age out this crate's
/// own [`crate::cache::ExecutorCache`].
#[derive(Clone, Debug)]
pub struct WorkerOptions {
    pub workflow_pollers: usize,
    pub activity_pollers: usize,
    /// 0 means unbounded.
    pub max_parallel_workflow_tasks: usize,
    /// 0 means unbounded.
    pub max_parallel_activity_tasks: usize,
    pub activity_heartbeat_interval: Duration,
    pub heartbeat_workflow_tasks: bool,
    pub workflow_heartbeat_interval: Duration,
    pub workflow_executor_cache_size: usize,
    pub workflow_executor_cache_ttl: Duration,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            workflow_pollers: 2,
            activity_pollers: 2,
            max_parallel_workflow_tasks: 0,
            max_parallel_activity_tasks: 0,
            activity_heartbeat_interval: Duration::from_secs(25),
            heartbeat_workflow_tasks: false,
            workflow_heartbeat_interval: Duration::from_secs(25),
            workflow_executor_cache_size: 128,
            workflow_executor_cache_ttl: Duration::from_secs(10),
        }
    }
}

/// Recognized backend options (spec.md §6). `Logger`/`Metrics`/
/// `TracerProvider` are covered by this crate's ambient `tracing` usage
/// rather than bespoke handles — the host wires its own subscriber.
#[derive(Clone, Copy, Debug)]
pub struct BackendOptions {
    pub sticky_timeout: Duration,
    pub workflow_lock_timeout: Duration,
    pub activity_lock_timeout: Duration,
}

impl Default for BackendOptions {
    fn default() -> Self {
        Self {
            sticky_timeout: Duration::from_secs(30),
            workflow_lock_timeout: Duration::from_secs(60),
            activity_lock_timeout: Duration::from_secs(120),
        }
    }
}
