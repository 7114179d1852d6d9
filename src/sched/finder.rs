//! The work finder.
//!
//! Composes the fast path, the local queue, global batch intake, and
//! stealing into one lookup with a fixed search order.

use crate::sched::Scheduler;
use crate::types::{WorkItem, WorkSource};

impl Scheduler {
    /// Finds the next goroutine for `pid`, in strict order: runnext and
    /// local queue, then a global batch, then stealing.
    pub(crate) fn find_runnable(&mut self, pid: u32) -> Option<WorkItem> {
        if let Some(item) = self.runqget(pid) {
            return Some(item);
        }
        if let Some(g) = self.globrunqget(pid, 0) {
            return Some(WorkItem {
                g,
                src: WorkSource::Global,
            });
        }
        self.steal_work(pid)
    }

    /// Dispatch primitive: runs one goroutine through the finder.
    ///
    /// Returns true when work was found and executed (to completion or
    /// yield), false when the finder came up empty.
    pub(crate) fn try_run_from_finder(&mut self, pid: u32) -> bool {
        match self.find_runnable(pid) {
            Some(item) => {
                self.execute_goroutine(pid, item);
                true
            }
            None => false,
        }
    }
}
