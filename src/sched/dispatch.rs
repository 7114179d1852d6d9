//! The dispatch loop.
//!
//! One round per tick: advance the timeline, check for termination, then
//! give every processor a dispatch opportunity according to its status.
//! Parked processors are skipped; idle ones get a single lookup and park on
//! failure; running ones get the full lookup plus one second chance when a
//! peer still has work.

use crate::sched::Scheduler;
use crate::sched_trace;
use crate::types::ProcStatus;

impl Scheduler {
    /// Runs the dispatch loop to termination.
    ///
    /// The loop exits when the global queue is empty, the timer list is
    /// drained, and every processor is parked. At that point every
    /// goroutine ever created has reached `Done` and been destroyed.
    pub fn schedule(&mut self) {
        self.main_started = true;
        let mut round: u64 = 1;

        loop {
            self.on_round_tick();

            if self.global.is_empty()
                && self.timers.is_empty()
                && self.idle_count() == self.procs.len()
            {
                break;
            }

            sched_trace!(self.trace, "--- Round {round} ---");
            for pid in 0..self.procs.len() as u32 {
                match self.procs[pid as usize].status() {
                    ProcStatus::Parked => {}
                    ProcStatus::Idle => {
                        if !self.try_run_from_finder(pid) {
                            self.pidle_put(pid);
                        }
                    }
                    ProcStatus::Running => {
                        if !self.try_run_from_finder(pid) {
                            let retried = self.any_other_proc_has_work(pid)
                                && self.try_run_from_finder(pid);
                            if !retried {
                                self.pidle_put(pid);
                            }
                        }
                    }
                }
            }
            round += 1;
        }

        tracing::debug!(
            rounds = round,
            ticks = self.ticks,
            "dispatch loop terminated"
        );
        debug_assert!(self.global.is_empty(), "termination with queued work");
        debug_assert!(
            self.arena.is_empty(),
            "termination with live goroutines"
        );
        debug_assert_eq!(
            self.idle_count(),
            self.procs.len(),
            "termination with unparked processors"
        );
    }

    /// True if any processor other than `pid` has local work.
    pub(crate) fn any_other_proc_has_work(&self, pid: u32) -> bool {
        self.procs
            .iter()
            .any(|p| p.pid() != pid && p.has_work())
    }
}
