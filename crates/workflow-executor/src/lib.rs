pub mod backend;
pub mod cache;
pub mod ctx;
pub mod error;
pub mod registry;
pub mod side_effect;
pub mod state;
pub mod translate;

pub mod executor;

pub use backend::{
    ActivityOutcome, ActivityTaskLease, Backend, BackendError, BackendOptions, InstanceState, WorkerOptions,
    WorkflowTaskLease,
};
pub use cache::{EvictionReason, EvictionSink, ExecutorCache, NoopSink};
pub use ctx::WorkflowCtx;
pub use error::ExecutorError;
pub use executor::{TaskKind, TurnOutput, WorkflowExecutor, WorkflowTask};
pub use registry::{ActivityFn, Registry, RegistryError, WorkflowFn};
pub use translate::OutboundEvent;
