//! The runner: one scheduling slice of a goroutine.
//!
//! The safepoint lives here. It is the single spot where a pending preempt
//! request is honored: immediately before the task would be called. A
//! consumed request yields the G back to the local queue tail without
//! invoking the task.

use crate::sched::Scheduler;
use crate::sched_trace;
use crate::types::{GoStatus, ProcStatus, WorkItem, YieldReason};

impl Scheduler {
    /// Executes one scheduling slice of `item` on processor `pid`.
    ///
    /// A finished goroutine is destroyed; a yielded one is tail-requeued
    /// with its recorded yield reason. Ends with `sync_status` on the P.
    pub(crate) fn execute_goroutine(&mut self, pid: u32, item: WorkItem) {
        self.procs[pid as usize].set_status(ProcStatus::Running);

        let Some(gid) = self.arena.get(item.g).map(|record| record.id()) else {
            debug_assert!(false, "dispatched a dead goroutine handle");
            return;
        };

        // Dispatch-time preempt injection, when the host installed a policy.
        if let Some(hook) = self.preempt_inject_hook {
            if hook(gid) {
                if let Some(record) = self.arena.get_mut(item.g) {
                    record.request_preempt();
                }
            }
        }

        sched_trace!(self.trace, "P{pid}: Executing G{gid} (from {})", item.src);
        tracing::trace!(pid, gid, src = %item.src, "executing goroutine");

        let finished = self.run_slice(item.g);
        if finished {
            sched_trace!(self.trace, "P{pid}: G{gid} done");
            self.destroyproc(item.g);
        } else {
            let reason = self
                .arena
                .get(item.g)
                .map_or(YieldReason::Unknown, |record| record.last_yield_reason());
            sched_trace!(self.trace, "[yield] P{pid}: G{gid} ({reason}) -> tail");
            self.runqput_tail_with_reason(pid, item.g, reason);
        }

        self.procs[pid as usize].sync_status();
    }

    /// Runs one slice of `g`. Returns true when the goroutine finished.
    ///
    /// A G that is not execution-ready (wrong status or missing task) is
    /// marked `Done` and reported finished. Otherwise the safepoint checks
    /// for a pending preempt request; if one is consumed the task is not
    /// invoked and the slice reports unfinished. Otherwise the task runs
    /// exactly once and the G is `Done`.
    fn run_slice(&mut self, g: crate::types::Gref) -> bool {
        let task = {
            let Some(record) = self.arena.get_mut(g) else {
                debug_assert!(false, "slice on a dead goroutine handle");
                return true;
            };
            if !record.is_execution_ready() {
                record.set_status(GoStatus::Done);
                return true;
            }
            // Safepoint.
            if record.consume_preempt() {
                return false;
            }
            record.set_status(GoStatus::Running);
            record.take_task()
        };

        if let Some(task) = task {
            task();
        }

        if let Some(record) = self.arena.get_mut(g) {
            record.set_status(GoStatus::Done);
        }
        true
    }
}
