//! The logical tick timeline: timers and the preemption pass.
//!
//! Time is a dimensionless counter advanced once per dispatch round. The
//! timer list is an unordered sequence; expiry scans it and removes entries
//! by swapping with the last element, so deletion is O(1) and the scan index
//! does not advance over a removal. Fired goroutines go to the global queue
//! through the enqueue-with-wake path.

use crate::sched::Scheduler;
use crate::sched_trace;
use crate::types::{Gref, Tick};

/// One pending timer: a goroutine and its absolute deadline tick.
#[derive(Debug, Clone, Copy)]
pub struct TimerEntry {
    /// The parked goroutine.
    pub g: Gref,
    /// Absolute tick at which the goroutine becomes runnable.
    pub deadline: Tick,
}

impl Scheduler {
    /// Advances the timeline by one tick: fires expired timers, then runs
    /// the preemption pass when its period has elapsed.
    pub(crate) fn on_round_tick(&mut self) {
        self.ticks += 1;
        self.process_expired_timers();
        self.maybe_preempt_pass();
    }

    /// Moves every timer with `deadline <= ticks` to the global queue.
    pub(crate) fn process_expired_timers(&mut self) {
        let now = self.ticks;
        let mut i = 0;
        while i < self.timers.len() {
            if self.timers[i].deadline <= now {
                let entry = self.timers.swap_remove(i);
                tracing::debug!(deadline = entry.deadline, now, "timer fired");
                self.globrunqput(entry.g);
                // swap_remove moved a new entry into slot i; rescan it.
            } else {
                i += 1;
            }
        }
    }

    /// Periodically marks each processor's next local candidate for
    /// preemption.
    ///
    /// Runs every `preempt_period` ticks. The candidate (runnext, else the
    /// local queue front) is peeked without being consumed; already-marked
    /// goroutines are skipped.
    pub(crate) fn maybe_preempt_pass(&mut self) {
        if self.ticks < self.next_preempt_tick {
            return;
        }
        self.next_preempt_tick += self.config.preempt_period;

        for pid in 0..self.procs.len() {
            let Some(g) = self.procs[pid].preview_local_next() else {
                continue;
            };
            let slot = if self.procs[pid].has_runnext() {
                "runnext"
            } else {
                "runq-front"
            };
            let Some(record) = self.arena.get_mut(g) else {
                debug_assert!(false, "queued goroutine has no record");
                continue;
            };
            if record.preempt_requested() {
                continue;
            }
            record.request_preempt();
            let gid = record.id();
            sched_trace!(self.trace, "[preemptor] mark G{gid} (P{pid} {slot})");
            tracing::trace!(gid, pid, slot, "preempt requested");
        }
    }

    /// Parks `g` on the timer list for `delay_ticks` ticks from now.
    ///
    /// The goroutine is detached from any queue position it currently holds
    /// (runnext, a local queue, or the global queue), so a timed G is never
    /// simultaneously runnable.
    pub fn timer_park(&mut self, g: Gref, delay_ticks: u64) {
        let _ = self.detach_from_queues(g);
        debug_assert!(
            self.arena.get(g).is_some(),
            "timer_park on a dead goroutine handle"
        );
        let deadline = self.ticks + delay_ticks;
        self.timers.push(TimerEntry { g, deadline });
        tracing::debug!(deadline, "goroutine parked on timer");
    }

    /// Removes `g` from whichever queue position holds it.
    ///
    /// Returns true if it was found in a runnext slot, a local queue, or
    /// the global queue.
    pub(crate) fn detach_from_queues(&mut self, g: Gref) -> bool {
        for p in &mut self.procs {
            if p.runnext() == Some(g) {
                let _ = p.take_runnext();
                return true;
            }
            if p.runq_mut().remove(g) {
                return true;
            }
        }
        self.global.remove(g, &mut self.arena)
    }
}
