//! Goroutine lifecycle: creation, processor targeting, destruction.

use crate::sched::goroutine::{Goroutine, TaskFn};
use crate::sched::Scheduler;
use crate::types::{GoStatus, Gref};
use std::sync::atomic::Ordering;

impl Scheduler {
    /// Creates a goroutine for `task` targeted at processor `pid`.
    ///
    /// The new G takes the next monotonic id and lands in `pid`'s runnext
    /// fast path. After the dispatch loop has started, one idle processor
    /// is nudged awake for the new work.
    ///
    /// # Panics
    ///
    /// Panics if `pid` is out of range.
    pub fn newproc(&mut self, pid: u32, task: TaskFn) -> Gref {
        assert!(
            (pid as usize) < self.procs.len(),
            "processor id {pid} out of range"
        );
        let id = self.goidgen.fetch_add(1, Ordering::Relaxed);
        let g = Gref(self.arena.insert(Goroutine::new(id, Some(task))));
        tracing::trace!(gid = id, pid, "goroutine created");

        // A parked P must never hold runnable work; make it eligible first.
        self.pidle_remove(pid);
        self.runqput(pid, g, true);
        if self.main_started {
            self.wakep();
        }
        g
    }

    /// Creates a goroutine on the next processor in round-robin order.
    pub fn newproc_auto(&mut self, task: TaskFn) -> Gref {
        let pid = (self.rr_cursor % self.procs.len()) as u32;
        self.rr_cursor = self.rr_cursor.wrapping_add(1);
        self.newproc(pid, task)
    }

    /// Destroys a finished goroutine: clears its scheduling link and frees
    /// the record.
    pub(crate) fn destroyproc(&mut self, g: Gref) {
        if let Some(record) = self.arena.get_mut(g) {
            record.set_link(None);
            debug_assert_eq!(
                record.status(),
                GoStatus::Done,
                "destroying a goroutine that has not finished"
            );
        }
        let removed = self.arena.remove(g.0);
        debug_assert!(removed.is_some(), "double destroy of a goroutine");
    }
}
