//! `Future[T]` (spec.md §3, §4.A): a single-assignment cell with completion
//! callbacks. `Get` suspends until `Set`; multiple waiters are allowed and
//! fire in registration order on `Set`.

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use workflow_types::ExecutionError;

struct Inner<T> {
    value: Option<Result<T, ExecutionError>>,
    wakers: Vec<Waker>,
}

/// A single-assignment, multi-waiter future cell. Cloning shares the same
/// underlying cell (`Rc`-backed), matching the pending-future table's need
/// to hand the same future out to both the scheduler and the executor's
/// `schedule_event_id` map (spec.md §9).
pub struct SharedFuture<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

impl<T> Clone for SharedFuture<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> SharedFuture<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                value: None,
                wakers: Vec::new(),
            })),
        }
    }

    pub fn ready(&self) -> bool {
        self.inner.borrow().value.is_some()
    }

    /// Resolve the cell. Callbacks (pending `Get`s) fire in the order they
    /// registered. Setting an already-set future is a no-op — a command
    /// completes at most once.
    pub fn set(&self, value: Result<T, ExecutionError>) {
        let wakers = {
            let mut inner = self.inner.borrow_mut();
            if inner.value.is_some() {
                return;
            }
            inner.value = Some(value);
            std::mem::take(&mut inner.wakers)
        };
        for waker in wakers {
            waker.wake();
        }
    }
}

impl<T> Default for SharedFuture<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Future for SharedFuture<T> {
    type Output = Result<T, ExecutionError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut inner = self.inner.borrow_mut();
        if let Some(value) = &inner.value {
            Poll::Ready(value.clone())
        } else {
            inner.wakers.push(cx.waker().clone());
            Poll::Pending
        }
    }
}
