//! `Select` (spec.md §4.A): race a set of registered cases, running exactly
//! one case's handler — the first case that resolves wins. On every poll,
//! cases are scanned starting from index 0, so if a poll makes two cases
//! ready simultaneously (e.g. a timer fires in the same task-quantum a
//! signal arrives), the earlier-registered case always wins. This directly
//! implements the spec's tie-break rule ("cases are considered in insertion
//! order and the first ready case fires") without separate bookkeeping.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::LocalBoxFuture;

use crate::channel::Channel;
use crate::error::CoopError;

/// Builder for a one-shot race between cases. Each case pairs a future with
/// a handler that runs on that future's output once it wins the race.
pub struct Selector {
    cases: Vec<LocalBoxFuture<'static, ()>>,
}

impl Selector {
    pub fn new() -> Self {
        Self { cases: Vec::new() }
    }

    /// Register an arbitrary future as a case.
    pub fn case_future<T, F>(mut self, fut: impl Future<Output = T> + 'static, handler: F) -> Self
    where
        F: FnOnce(T) + 'static,
    {
        self.cases.push(Box::pin(async move {
            let value = fut.await;
            handler(value);
        }));
        self
    }

    /// Register a channel receive as a case.
    pub fn case_receive<T: 'static>(
        self,
        channel: Channel<T>,
        handler: impl FnOnce(Result<T, CoopError>) + 'static,
    ) -> Self {
        self.case_future(async move { channel.receive().await }, handler)
    }

    /// A case that is always immediately ready. Registering this last gives
    /// a non-blocking default branch (spec.md §4.A "Select" default case):
    /// it only fires on the first poll if every other case is pending then.
    pub fn case_default(self, handler: impl FnOnce() + 'static) -> Self {
        self.case_future(async {}, handler)
    }

    pub fn select(self) -> Select {
        Select { cases: self.cases }
    }
}

impl Default for Selector {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves to the index of the first case whose future completed (and
/// whose handler has, by then, already run).
pub struct Select {
    cases: Vec<LocalBoxFuture<'static, ()>>,
}

impl Future for Select {
    type Output = usize;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        for (index, case) in this.cases.iter_mut().enumerate() {
            if case.as_mut().poll(cx).is_ready() {
                return Poll::Ready(index);
            }
        }
        Poll::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::future::SharedFuture;
    use crate::scheduler::{self, LocalScheduler};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn first_ready_case_wins_in_registration_order() {
        let scheduler = LocalScheduler::new();
        let fired: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));

        let a: SharedFuture<i64> = SharedFuture::new();
        let b: SharedFuture<i64> = SharedFuture::new();
        a.set(Ok(1));
        b.set(Ok(2));

        let fired2 = fired.clone();
        let fired3 = fired.clone();
        let (a2, b2) = (a.clone(), b.clone());
        scheduler::spawn(&scheduler, async move {
            let winner = Selector::new()
                .case_future(a2, move |_| fired2.borrow_mut().push("a"))
                .case_future(b2, move |_| fired3.borrow_mut().push("b"))
                .select()
                .await;
            assert_eq!(winner, 0);
        });
        scheduler::run_until_stalled(&scheduler);
        assert_eq!(*fired.borrow(), vec!["a"]);
    }

    #[test]
    fn default_case_fires_only_when_nothing_else_is_ready() {
        let scheduler = LocalScheduler::new();
        let fired: Rc<RefCell<Option<&'static str>>> = Rc::new(RefCell::new(None));

        let pending: SharedFuture<i64> = SharedFuture::new();

        let fired2 = fired.clone();
        let fired3 = fired.clone();
        let pending2 = pending.clone();
        scheduler::spawn(&scheduler, async move {
            Selector::new()
                .case_future(pending2, move |_| *fired2.borrow_mut() = Some("value"))
                .case_default(move || *fired3.borrow_mut() = Some("default"))
                .select()
                .await;
        });
        scheduler::run_until_stalled(&scheduler);
        assert_eq!(*fired.borrow(), Some("default"));
    }
}
