//! A single-threaded, non-`Send` executor for the in-workflow cooperative
//! layer (spec.md §4.A, §5, §9: "implementations that lack stackful
//! coroutines model each cooperative task as a state machine driven by a
//! run queue").
//!
//! Grounded on the shape of `asynchronix::st_executor::Executor` (a
//! `Slab`-indexed active-task table drained by a single-threaded run loop)
//! and on `futures-rs::current_thread`'s non-`Send` task-executor idiom:
//! this whole module is built around `Rc`, never `Arc`, and the scheduler
//! itself may not cross a thread boundary.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

use slab::Slab;

/// Handle to a spawned task. Currently opaque; kept so callers have a
/// stable reference to a task without reaching into the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskId(pub(crate) usize);

type BoxedTask = Pin<Box<dyn Future<Output = ()>>>;

/// FIFO run queue plus slab of in-flight tasks. At most one task runs at
/// any instant; [`run_until_stalled`] drains ready tasks in FIFO order
/// until none remain runnable (spec.md §4.A "quiescence").
pub struct LocalScheduler {
    tasks: RefCell<Slab<Option<BoxedTask>>>,
    ready: Rc<RefCell<VecDeque<usize>>>,
}

impl LocalScheduler {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            tasks: RefCell::new(Slab::new()),
            ready: Rc::new(RefCell::new(VecDeque::new())),
        })
    }

    /// True if no task is runnable and the ready queue is empty.
    pub fn is_quiescent(&self) -> bool {
        self.ready.borrow().is_empty()
    }

    /// Number of tasks still tracked (running or suspended).
    pub fn task_count(&self) -> usize {
        self.tasks.borrow().len()
    }
}

/// Spawn a future onto `scheduler`'s run queue. The task is polled for the
/// first time on the next [`run_until_stalled`] call, never inline — this
/// keeps spawn a synchronous, non-reentrant operation safe to call from
/// inside a task that is itself being polled.
pub fn spawn(scheduler: &Rc<LocalScheduler>, fut: impl Future<Output = ()> + 'static) -> TaskId {
    let id = scheduler.tasks.borrow_mut().insert(Some(Box::pin(fut)));
    scheduler.ready.borrow_mut().push_back(id);
    TaskId(id)
}

/// Drain the ready queue until no task is runnable. Each task is taken out
/// of the slab before being polled and reinserted at the same slot if
/// still pending, so a task that spawns further tasks (or otherwise
/// touches the scheduler) while being polled never re-enters an
/// already-borrowed `RefCell`.
pub fn run_until_stalled(scheduler: &Rc<LocalScheduler>) {
    loop {
        let id = match scheduler.ready.borrow_mut().pop_front() {
            Some(id) => id,
            None => break,
        };

        let mut fut = {
            let mut tasks = scheduler.tasks.borrow_mut();
            match tasks.get_mut(id).and_then(|slot| slot.take()) {
                Some(fut) => fut,
                None => continue,
            }
        };

        let waker_inner = Rc::new(TaskWakerInner {
            task_id: id,
            ready: Rc::downgrade(&scheduler.ready),
        });
        let waker = unsafe { Waker::from_raw(raw_waker(waker_inner)) };
        let mut cx = Context::from_waker(&waker);

        match fut.as_mut().poll(&mut cx) {
            Poll::Ready(()) => {
                scheduler.tasks.borrow_mut().try_remove(id);
            }
            Poll::Pending => {
                if let Some(slot) = scheduler.tasks.borrow_mut().get_mut(id) {
                    *slot = Some(fut);
                }
            }
        }
    }
}

struct TaskWakerInner {
    task_id: usize,
    ready: Weak<RefCell<VecDeque<usize>>>,
}

fn do_wake(inner: &TaskWakerInner) {
    if let Some(ready) = inner.ready.upgrade() {
        ready.borrow_mut().push_back(inner.task_id);
    }
}

fn raw_waker(inner: Rc<TaskWakerInner>) -> RawWaker {
    RawWaker::new(Rc::into_raw(inner) as *const (), &VTABLE)
}

static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, wake, wake_by_ref, drop_waker);

unsafe fn clone(ptr: *const ()) -> RawWaker {
    let rc = unsafe { Rc::from_raw(ptr as *const TaskWakerInner) };
    let cloned = Rc::clone(&rc);
    std::mem::forget(rc);
    raw_waker(cloned)
}

unsafe fn wake(ptr: *const ()) {
    let rc = unsafe { Rc::from_raw(ptr as *const TaskWakerInner) };
    do_wake(&rc);
}

unsafe fn wake_by_ref(ptr: *const ()) {
    let rc = unsafe { Rc::from_raw(ptr as *const TaskWakerInner) };
    do_wake(&rc);
    std::mem::forget(rc);
}

unsafe fn drop_waker(ptr: *const ()) {
    drop(unsafe { Rc::from_raw(ptr as *const TaskWakerInner) });
}
