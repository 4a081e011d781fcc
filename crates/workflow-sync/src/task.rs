//! `go` (spec.md §4.A): spawn a concurrent task under a `CoopContext`. A
//! thin wrapper over [`scheduler::spawn`] so call sites never touch the
//! scheduler directly.

use crate::context::CoopContext;
use crate::scheduler::TaskId;

/// Spawn `fut` onto `ctx`'s scheduler. The task starts running on the next
/// drain, concurrently with whatever called `go`.
pub fn go(ctx: &CoopContext, fut: impl std::future::Future<Output = ()> + 'static) -> TaskId {
    ctx.spawn(fut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{self, LocalScheduler};
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn go_runs_the_spawned_task() {
        let scheduler = LocalScheduler::new();
        let ctx = CoopContext::new(scheduler.clone());
        let ran = Rc::new(Cell::new(false));
        let ran2 = ran.clone();
        go(&ctx, async move {
            ran2.set(true);
        });
        scheduler::run_until_stalled(&scheduler);
        assert!(ran.get());
    }
}
