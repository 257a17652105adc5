use std::mem;
use std::time::{Duration, Instant};

use tracing::trace;

/// Work the model pushes off until after the triggering state change has
/// been rendered. Drained once per frame.
#[derive(Debug, Clone, PartialEq)]
pub enum DeferredTask {
    /// Reveal the clear-filter affordance of one input after its value was
    /// bound from a persisted snapshot.
    RevealClearFilter { column: u16 },
    /// Disable or enable every non-id filter input control.
    SetOtherFiltersDisabled { disabled: bool },
    /// (Re)attach hover-detail hints to the visible page rows.
    AttachRowHints,
}

#[derive(Debug)]
struct Pending {
    task: DeferredTask,
    due: Option<Instant>,
}

/// A queue of deferred tasks. Scheduling a task of a kind already pending
/// replaces the pending one, so rapid repeated triggering never accumulates
/// duplicates. `cancel_all` invalidates everything still pending.
#[derive(Debug, Default)]
pub struct DeferredQueue {
    pending: Vec<Pending>,
}

impl DeferredQueue {
    /// Schedule for the next drain.
    pub fn next_tick(&mut self, task: DeferredTask) {
        self.schedule(task, None);
    }

    /// Schedule to run once `delay` has elapsed.
    pub fn after(&mut self, task: DeferredTask, delay: Duration) {
        self.schedule(task, Some(Instant::now() + delay));
    }

    fn schedule(&mut self, task: DeferredTask, due: Option<Instant>) {
        self.pending.retain(|p| !Self::same_slot(&p.task, &task));
        trace!("Deferring {task:?}");
        self.pending.push(Pending { task, due });
    }

    // Two tasks occupy the same slot when running both would be redundant.
    fn same_slot(a: &DeferredTask, b: &DeferredTask) -> bool {
        match (a, b) {
            (
                DeferredTask::RevealClearFilter { column: ca },
                DeferredTask::RevealClearFilter { column: cb },
            ) => ca == cb,
            _ => mem::discriminant(a) == mem::discriminant(b),
        }
    }

    /// Remove and return every task due at `now`. Tasks scheduled while a
    /// drain's results are being applied wait for the next drain.
    pub fn drain_due(&mut self, now: Instant) -> Vec<DeferredTask> {
        let (due, pending): (Vec<Pending>, Vec<Pending>) = mem::take(&mut self.pending)
            .into_iter()
            .partition(|p| p.due.is_none_or(|at| at <= now));
        self.pending = pending;
        due.into_iter().map(|p| p.task).collect()
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
