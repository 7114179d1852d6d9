//! Idle-processor parking stack.
//!
//! Parked processors form a LIFO stack chained through each P's intrusive
//! idle link, with an atomic `npidle` mirror of its length. LIFO gives the
//! fastest reuse of the most recently idled processor; fairness at the P
//! level is irrelevant.
//!
//! A woken P is not handed work here. It becomes eligible again and the
//! next dispatch round routes work to it through the finder.

use crate::sched::Scheduler;
use crate::sched_trace;
use crate::types::ProcStatus;
use std::sync::atomic::Ordering;

impl Scheduler {
    /// Parks processor `pid`: status becomes `Parked`, the P is pushed onto
    /// the idle stack, and `npidle` is incremented.
    ///
    /// Precondition: the P has no runnable work.
    pub(crate) fn pidle_put(&mut self, pid: u32) {
        let head = self.pidle_head;
        let p = &mut self.procs[pid as usize];
        debug_assert!(!p.has_work(), "parking a processor that still has work");
        debug_assert_ne!(p.status(), ProcStatus::Parked, "double park");

        p.set_status(ProcStatus::Parked);
        p.set_idle_link(head);
        self.pidle_head = Some(pid);
        let idle = self.npidle.fetch_add(1, Ordering::Relaxed) + 1;
        sched_trace!(self.trace, "[pidle] +P{pid} (idle={idle})");
        tracing::trace!(pid, idle, "processor parked");
    }

    /// Pops the most recently parked processor, if any.
    ///
    /// The popped P's link is cleared and its status set to `Running`.
    pub(crate) fn pidle_get(&mut self) -> Option<u32> {
        let pid = self.pidle_head?;
        let p = &mut self.procs[pid as usize];
        debug_assert_eq!(p.status(), ProcStatus::Parked, "idle stack holds a non-parked P");

        self.pidle_head = p.idle_link();
        p.set_idle_link(None);
        p.set_status(ProcStatus::Running);
        let idle = self.npidle.fetch_sub(1, Ordering::Relaxed) - 1;
        sched_trace!(self.trace, "[pidle] -P{pid} (idle={idle})");
        tracing::trace!(pid, idle, "processor woken");
        Some(pid)
    }

    /// Wakes up to `n` parked processors; returns the count actually woken.
    pub(crate) fn try_wake(&mut self, n: usize) -> usize {
        let target = n.min(self.idle_count());
        let mut woken = 0;
        while woken < target {
            if self.pidle_get().is_none() {
                break;
            }
            woken += 1;
        }
        woken
    }

    /// Single wake entry point for sources publishing new work (`k` items).
    ///
    /// Up to `k` idle processors are un-parked and will be considered by the
    /// current or next dispatch round; no specific P is chosen for the
    /// produced work.
    pub(crate) fn wake_for_new_work(&mut self, k: usize) -> usize {
        if k == 0 {
            return 0;
        }
        self.try_wake(k.min(self.idle_count()))
    }

    /// Wakes one processor after a fresh `newproc`, the way the runtime
    /// nudges a P when new work appears mid-run.
    pub(crate) fn wakep(&mut self) {
        let _ = self.wake_for_new_work(1);
    }

    /// Unlinks a specific parked processor from the idle stack.
    ///
    /// Required when new work is targeted directly at a parked P: a parked
    /// processor must never hold runnable work, so the P is made eligible
    /// again before the enqueue. No-op when the P is not parked.
    pub(crate) fn pidle_remove(&mut self, pid: u32) {
        if self.procs[pid as usize].status() != ProcStatus::Parked {
            return;
        }

        let mut prev: Option<u32> = None;
        let mut cursor = self.pidle_head;
        while let Some(cur) = cursor {
            if cur == pid {
                let next = self.procs[cur as usize].idle_link();
                match prev {
                    Some(prev) => self.procs[prev as usize].set_idle_link(next),
                    None => self.pidle_head = next,
                }
                let p = &mut self.procs[pid as usize];
                p.set_idle_link(None);
                p.set_status(ProcStatus::Idle);
                let idle = self.npidle.fetch_sub(1, Ordering::Relaxed) - 1;
                sched_trace!(self.trace, "[pidle] -P{pid} (idle={idle})");
                tracing::trace!(pid, idle, "parked processor unlinked for new work");
                return;
            }
            prev = cursor;
            cursor = self.procs[cur as usize].idle_link();
        }
        debug_assert!(false, "parked processor missing from the idle stack");
    }
}

#[cfg(test)]
mod tests {
    use crate::config::SchedConfig;
    use crate::sched::Scheduler;
    use crate::types::ProcStatus;

    fn sched(nprocs: usize) -> Scheduler {
        let cfg = SchedConfig {
            nprocs,
            debug: true,
            trace_echo: false,
            ..SchedConfig::default()
        };
        Scheduler::new(cfg).expect("valid config")
    }

    #[test]
    fn park_then_pop_is_lifo() {
        let mut s = sched(3);
        s.pidle_put(0);
        s.pidle_put(1);
        s.pidle_put(2);
        assert_eq!(s.idle_count(), 3);

        assert_eq!(s.pidle_get(), Some(2), "most recently parked pops first");
        assert_eq!(s.pidle_get(), Some(1));
        assert_eq!(s.pidle_get(), Some(0));
        assert_eq!(s.pidle_get(), None);
        assert_eq!(s.idle_count(), 0);
    }

    #[test]
    fn park_sets_status_and_pop_clears_it() {
        let mut s = sched(2);
        s.pidle_put(1);
        assert_eq!(s.procs[1].status(), ProcStatus::Parked);
        assert_eq!(s.idle_count(), 1);

        let popped = s.pidle_get().expect("one parked P");
        assert_eq!(popped, 1);
        assert_eq!(s.procs[1].status(), ProcStatus::Running);
        assert!(s.procs[1].idle_link().is_none(), "link cleared on pop");
    }

    #[test]
    fn npidle_mirrors_stack_length() {
        let mut s = sched(4);
        for pid in 0..4 {
            s.pidle_put(pid);
        }
        assert_eq!(s.idle_count(), 4);

        // Count by walking the intrusive chain.
        let mut len = 0;
        let mut cursor = s.pidle_head;
        while let Some(pid) = cursor {
            len += 1;
            cursor = s.procs[pid as usize].idle_link();
        }
        assert_eq!(len, s.idle_count(), "npidle must equal stack length");
    }

    #[test]
    fn try_wake_caps_at_idle_count() {
        let mut s = sched(3);
        s.pidle_put(0);
        s.pidle_put(1);

        assert_eq!(s.try_wake(5), 2, "cannot wake more than are parked");
        assert_eq!(s.idle_count(), 0);
        assert_eq!(s.try_wake(1), 0, "nothing left to wake");
    }

    #[test]
    fn wake_for_new_work_zero_is_noop() {
        let mut s = sched(2);
        s.pidle_put(0);
        assert_eq!(s.wake_for_new_work(0), 0);
        assert_eq!(s.idle_count(), 1);
    }

    #[test]
    fn pidle_remove_unlinks_from_the_middle() {
        let mut s = sched(3);
        s.pidle_put(0);
        s.pidle_put(1);
        s.pidle_put(2);

        s.pidle_remove(1);
        assert_eq!(s.idle_count(), 2);
        assert_eq!(s.procs[1].status(), ProcStatus::Idle);
        assert!(s.procs[1].idle_link().is_none());

        // Remaining stack order is untouched: 2 then 0.
        assert_eq!(s.pidle_get(), Some(2));
        assert_eq!(s.pidle_get(), Some(0));
        assert_eq!(s.pidle_get(), None);
    }

    #[test]
    fn pidle_remove_on_unparked_proc_is_noop() {
        let mut s = sched(2);
        s.pidle_put(1);
        s.pidle_remove(0);
        assert_eq!(s.idle_count(), 1, "only parked P's are unlinked");
    }

    #[test]
    fn pidle_trace_lines() {
        let mut s = sched(2);
        s.pidle_put(0);
        s.pidle_put(1);
        let _ = s.pidle_get();

        let trace = s.trace_handle();
        assert!(trace.any_containing("[pidle] +P0 (idle=1)"));
        assert!(trace.any_containing("[pidle] +P1 (idle=2)"));
        assert!(trace.any_containing("[pidle] -P1 (idle=1)"));
    }
}
