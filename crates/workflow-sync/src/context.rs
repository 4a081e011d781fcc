//! `CoopContext` (spec.md §4.A): the ambient handle every in-workflow task
//! carries. It owns the scheduler a task may spawn further tasks onto, a
//! cancellation flag propagated cooperatively (spec.md §4.A "Cancel"), and a
//! small type-keyed value bag used to thread host-provided values (e.g. a
//! workflow's `WorkflowState` handle) down to primitives without a global.

use std::any::{Any, TypeId};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::CoopError;
use crate::future::SharedFuture;
use crate::scheduler::{self, LocalScheduler, TaskId};

/// Shared, cloneable handle threaded through an in-workflow task tree.
///
/// Deliberately holds the scheduler as an explicit field rather than
/// reaching for a `thread_local!` ambient instance: a context carries
/// everything a primitive needs to suspend or spawn, which keeps every
/// scheduler-touching function testable without process-global state.
#[derive(Clone)]
pub struct CoopContext {
    scheduler: Rc<LocalScheduler>,
    cancelled: Rc<Cell<bool>>,
    done: SharedFuture<()>,
    values: Rc<RefCell<HashMap<TypeId, Rc<dyn Any>>>>,
}

impl CoopContext {
    pub fn new(scheduler: Rc<LocalScheduler>) -> Self {
        Self {
            scheduler,
            cancelled: Rc::new(Cell::new(false)),
            done: SharedFuture::new(),
            values: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    pub fn scheduler(&self) -> &Rc<LocalScheduler> {
        &self.scheduler
    }

    pub fn spawn(&self, fut: impl std::future::Future<Output = ()> + 'static) -> TaskId {
        scheduler::spawn(&self.scheduler, fut)
    }

    /// True once [`cancel`](Self::cancel) has been called for this context
    /// or an ancestor it was cloned from.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }

    /// If cancelled, the error every suspended primitive should resolve
    /// with instead of its normal result.
    pub fn err(&self) -> Option<CoopError> {
        self.is_cancelled().then_some(CoopError::Canceled)
    }

    /// Mark this context (and every clone of it) cancelled and wake every
    /// task awaiting [`done`](Self::done). Idempotent.
    pub fn cancel(&self) {
        if self.cancelled.replace(true) {
            return;
        }
        self.done.set(Ok(()));
    }

    /// A future that resolves exactly when [`cancel`](Self::cancel) is
    /// called. Used by `select`-style primitives to race cancellation
    /// against a normal wait (spec.md §4.A "Cancel" case).
    pub fn done(&self) -> SharedFuture<()> {
        self.done.clone()
    }

    /// Attach a value of type `T`, replacing any previous value of that
    /// type. Used to make host state (e.g. the owning `WorkflowState`)
    /// reachable from primitives constructed deep in a task tree.
    pub fn with_value<T: 'static>(&self, value: T) {
        self.values
            .borrow_mut()
            .insert(TypeId::of::<T>(), Rc::new(value));
    }

    /// Fetch a previously attached value of type `T`, if any.
    pub fn value<T: 'static>(&self) -> Option<Rc<T>> {
        self.values
            .borrow()
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|v| v.downcast::<T>().ok())
    }
}
