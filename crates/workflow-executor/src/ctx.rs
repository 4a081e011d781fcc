//! `WorkflowCtx`: the handle passed to a registered workflow function.
//! Generalizes `original_source/pkg/workflow/workflow.go`'s free functions
//! (`ExecuteActivity`, `Sleep`, `ExecuteSubWorkflow`, `NewSignalChannel`)
//! into methods on one cooperative-context-plus-state handle, since Rust
//! has no package-level ambient workflow context to hang them off of.

use std::cell::RefCell;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use workflow_sync::{CoopContext, SharedFuture};
use workflow_types::{
    CommandAttrs, Converter, ErrorKind, ExecutionError, JsonConverter, Metadata, Payload, RetryPolicy,
    WorkflowInstance,
};

use crate::state::WorkflowState;
use crate::translate::mint_child_execution_id;

/// Passed by value to every workflow/sub-workflow invocation. Cheap to
/// clone: everything it owns is `Rc`-backed and shared with the executor
/// that created it.
#[derive(Clone)]
pub struct WorkflowCtx {
    pub(crate) coop: CoopContext,
    pub(crate) state: Rc<RefCell<WorkflowState>>,
    pub(crate) instance: WorkflowInstance,
    pub(crate) converter: JsonConverter,
}

impl WorkflowCtx {
    pub fn new(coop: CoopContext, state: Rc<RefCell<WorkflowState>>, instance: WorkflowInstance) -> Self {
        Self {
            coop,
            state,
            instance,
            converter: JsonConverter,
        }
    }

    pub fn instance(&self) -> &WorkflowInstance {
        &self.instance
    }

    pub fn is_replaying(&self) -> bool {
        self.state.borrow().is_replaying()
    }

    pub fn is_cancelled(&self) -> bool {
        self.coop.is_cancelled()
    }

    /// Spawn a concurrent cooperative task (spec.md §4.A `go(ctx, fn)`).
    pub fn go(&self, fut: impl std::future::Future<Output = ()> + 'static) {
        self.coop.spawn(fut);
    }

    /// A future that resolves exactly when this workflow's context is
    /// cancelled (spec.md §4.A "Cancel" case) — the in-workflow analogue of
    /// `context.Context.Done()`, for racing against a normal wait in a
    /// `Select`.
    pub fn cancelled(&self) -> SharedFuture<()> {
        self.coop.done()
    }

    fn cancelled_error() -> ExecutionError {
        ExecutionError::new(ErrorKind::Cancelled, "workflow context cancelled")
    }

    /// Allocate a schedule-event-id, register its pending future, and
    /// return both — the shared setup every scheduling primitive performs
    /// before suspending.
    fn schedule(&self, attrs: CommandAttrs) -> (i64, Rc<SharedFuture<Payload>>) {
        let mut state = self.state.borrow_mut();
        let id = state.next_schedule_event_id();
        state.add_command(id, attrs);
        let future = Rc::new(SharedFuture::new());
        state.register_pending_future(id, future.clone());
        (id, future)
    }

    /// Schedule an activity and suspend until it completes (spec.md §4.A,
    /// grounded on `ExecuteActivity` in `original_source/workflow/activity.go`).
    pub async fn execute_activity<A, T>(
        &self,
        name: &str,
        args: &A,
        retry_policy: Option<RetryPolicy>,
    ) -> Result<T, ExecutionError>
    where
        A: Serialize,
        T: DeserializeOwned,
    {
        if self.coop.is_cancelled() {
            return Err(Self::cancelled_error());
        }
        let inputs = self
            .converter
            .to_payload(args)
            .map_err(|e| ExecutionError::new(ErrorKind::ConversionError, e.to_string()))?;
        let (_id, future) = self.schedule(CommandAttrs::ScheduleActivity {
            name: name.to_string(),
            inputs,
            metadata: Metadata::new(),
            retry_policy,
        });
        let payload = (*future).clone().await?;
        self.converter
            .from_payload(&payload)
            .map_err(|e| ExecutionError::new(ErrorKind::ConversionError, e.to_string()))
    }

    /// Suspend until `state.time()` (the logical clock, not the wall clock)
    /// advances past `at` (spec.md §4.A / §5: no real-world time source may
    /// be observed while replaying).
    pub async fn sleep_until(&self, at: chrono::DateTime<chrono::Utc>) -> Result<(), ExecutionError> {
        if self.coop.is_cancelled() {
            return Err(Self::cancelled_error());
        }
        let (_id, future) = self.schedule(CommandAttrs::ScheduleTimer { at });
        future.as_ref().clone().await.map(|_| ())
    }

    pub async fn sleep(&self, duration: chrono::Duration) -> Result<(), ExecutionError> {
        let at = self.state.borrow().time() + duration;
        self.sleep_until(at).await
    }

    /// Schedule a sub-workflow and suspend until it completes. The child's
    /// `execution_id` is minted deterministically so replay reproduces the
    /// same child identity without coordination (spec.md §3 note in
    /// `workflow_types::instance`).
    pub async fn execute_sub_workflow<A, T>(
        &self,
        instance_id: &str,
        name: &str,
        args: &A,
    ) -> Result<T, ExecutionError>
    where
        A: Serialize,
        T: DeserializeOwned,
    {
        if self.coop.is_cancelled() {
            return Err(Self::cancelled_error());
        }
        let inputs = self
            .converter
            .to_payload(args)
            .map_err(|e| ExecutionError::new(ErrorKind::ConversionError, e.to_string()))?;

        let next_id = self.state.borrow().peek_next_schedule_event_id();
        let child_execution_id = mint_child_execution_id(&self.instance, next_id, name);

        let (_id, future) = self.schedule(CommandAttrs::ScheduleSubWorkflow {
            child_instance_id: instance_id.to_string(),
            child_execution_id,
            name: name.to_string(),
            inputs,
            metadata: Metadata::new(),
        });
        let payload = (*future).clone().await?;
        self.converter
            .from_payload(&payload)
            .map_err(|e| ExecutionError::new(ErrorKind::ConversionError, e.to_string()))
    }

    /// Request cancellation of a running sub-workflow. Fire-and-forget: the
    /// engine does not wait for the child to observe it.
    pub fn cancel_sub_workflow(&self, child_instance_id: &str, child_execution_id: &str) {
        let mut state = self.state.borrow_mut();
        let id = state.next_schedule_event_id();
        state.add_command(
            id,
            CommandAttrs::CancelSubWorkflow {
                child_instance_id: child_instance_id.to_string(),
                child_execution_id: child_execution_id.to_string(),
            },
        );
    }

    /// Receive the next value on a named signal channel, creating it if
    /// this is the first reference (spec.md §9 "lazily created by name").
    pub async fn receive_signal<T: DeserializeOwned>(&self, name: &str) -> Result<T, ExecutionError> {
        let channel = self.state.borrow_mut().signal_channel(name);
        let payload = channel
            .receive()
            .await
            .map_err(|_| ExecutionError::new(ErrorKind::Cancelled, "signal channel closed"))?;
        self.converter
            .from_payload(&payload)
            .map_err(|e| ExecutionError::new(ErrorKind::ConversionError, e.to_string()))
    }
}
