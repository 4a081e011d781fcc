//! Cooperative in-workflow scheduler (spec.md §4.A, component A): a
//! single-threaded task/future/channel/selector layer strictly separate
//! from the host's own async runtime (spec.md §5). Nothing in this crate
//! crosses a thread boundary or performs real I/O; it only orders
//! suspensions and wakeups deterministically so a [`workflow-executor`]
//! driving it can replay that order from history.

pub mod channel;
pub mod context;
pub mod error;
pub mod future;
pub mod scheduler;
pub mod selector;
pub mod task;

pub use channel::Channel;
pub use context::CoopContext;
pub use error::CoopError;
pub use future::SharedFuture;
pub use scheduler::{LocalScheduler, TaskId};
pub use selector::{Select, Selector};
pub use task::go;
