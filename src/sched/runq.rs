//! Run queue operations: the local fast path, overflow spill, and the
//! global batch heuristics.
//!
//! `runnext` is reserved for freshly scheduled goroutines (the VIP slot) and
//! is refilled only by new `newproc` calls, never from the local queue on
//! dequeue. Actively promoting on dequeue would add per-dispatch overhead
//! and degrade fairness for existing tail residents.

use crate::config::LOCAL_QUEUE_CAP;
use crate::sched::Scheduler;
use crate::types::{Gref, WorkItem, WorkSource};
use smallvec::SmallVec;

/// Inline capacity of the overflow-spill buffer: half the contractual local
/// queue plus the overflowing goroutine itself.
const SPILL_BUF: usize = LOCAL_QUEUE_CAP / 2 + 1;

impl Scheduler {
    /// Enqueues `g` on processor `pid`.
    ///
    /// With `to_runnext`, `g` lands in the fast path; an existing occupant
    /// is demoted to the local queue tail, falling back to the overflow
    /// spill when the queue is full. Without it, `g` goes straight to the
    /// tail (or the spill).
    pub(crate) fn runqput(&mut self, pid: u32, g: Gref, to_runnext: bool) {
        if to_runnext {
            let p = &mut self.procs[pid as usize];
            let Some(demoted) = p.set_runnext(g) else {
                return;
            };
            if p.runq_mut().push_back(demoted) {
                return;
            }
            self.runqputslow(pid, demoted);
            return;
        }

        let p = &mut self.procs[pid as usize];
        if p.runq_mut().push_back(g) {
            return;
        }
        self.runqputslow(pid, g);
    }

    /// Tail-enqueues a yielded goroutine. Thin wrapper over
    /// [`runqput`](Self::runqput) with `to_runnext = false`; the reason has
    /// already been recorded on the G and is passed along for diagnostics.
    pub(crate) fn runqput_tail_with_reason(
        &mut self,
        pid: u32,
        g: Gref,
        reason: crate::types::YieldReason,
    ) {
        tracing::trace!(pid, %reason, "tail requeue");
        self.runqput(pid, g, false);
    }

    /// Overflow spill: moves the first half of `pid`'s local queue, plus
    /// `new_g`, to the global queue in one batch, then wakes.
    ///
    /// In debug mode the batch is shuffled first, modeling the runtime's
    /// `randomizeScheduler`. When the queue was not actually full (half is
    /// zero) the new goroutine goes to the global queue directly.
    pub(crate) fn runqputslow(&mut self, pid: u32, new_g: Gref) {
        let half = self.procs[pid as usize].runq().len() / 2;
        if half == 0 {
            self.globrunqput(new_g);
            return;
        }

        let mut batch: SmallVec<[Gref; SPILL_BUF]> = SmallVec::new();
        {
            let q = self.procs[pid as usize].runq_mut();
            for _ in 0..half {
                match q.pop_front() {
                    Some(g) => batch.push(g),
                    None => break,
                }
            }
        }
        batch.push(new_g);

        if self.config.debug {
            self.rng.shuffle(&mut batch);
        }

        let count = batch.len();
        self.global.push_batch(&batch, &mut self.arena);
        tracing::debug!(pid, count, "local queue spilled to global");
        let _ = self.wake_for_new_work(count);
    }

    /// Takes the next goroutine from `pid`'s fast path or local queue.
    ///
    /// Passive replenishment: a consumed runnext is not refilled from the
    /// local queue.
    pub(crate) fn runqget(&mut self, pid: u32) -> Option<WorkItem> {
        let p = &mut self.procs[pid as usize];
        if let Some(g) = p.take_runnext() {
            return Some(WorkItem {
                g,
                src: WorkSource::Runnext,
            });
        }
        p.runq_mut().pop_front().map(|g| WorkItem {
            g,
            src: WorkSource::Runq,
        })
    }

    /// Enqueues one goroutine on the global queue and wakes one processor.
    pub(crate) fn globrunqput(&mut self, g: Gref) {
        if let Some(record) = self.arena.get_mut(g) {
            record.set_link(None);
        }
        self.global.push_batch(&[g], &mut self.arena);
        let _ = self.wake_for_new_work(1);
    }

    /// Takes a batch from the global queue for processor `pid`.
    ///
    /// Batch size: `len / nproc + 1`, clamped to half the global queue, to
    /// `cap_hint` when positive, to half the local capacity, and to the
    /// local queue's available capacity; when the clamp reaches zero but the
    /// queue is non-empty and a slot is free, exactly one is taken. The
    /// first element is returned for immediate execution; the rest are
    /// ingested into `pid`'s local queue, which cannot fail after the
    /// available-capacity clamp.
    pub(crate) fn globrunqget(&mut self, pid: u32, cap_hint: usize) -> Option<Gref> {
        if self.global.is_empty() {
            return None;
        }
        let len = self.global.len();
        let nproc = self.procs.len();
        let local_cap = self.procs[pid as usize].runq().capacity();
        let available = self.procs[pid as usize].runq().available();

        let mut n = len / nproc + 1;
        n = n.min(len / 2);
        if cap_hint > 0 {
            n = n.min(cap_hint);
        }
        n = n.min(local_cap / 2);
        n = n.min(available);
        if n == 0 {
            if available == 0 {
                return None;
            }
            n = 1;
        }

        let cut = self.global.cut_front(n, &mut self.arena)?;
        if cut.chain_len > 0 {
            let ingested = self.procs[pid as usize]
                .runq_mut()
                .ingest_chain(cut.chain_head, &mut self.arena);
            debug_assert!(
                ingested.is_ok(),
                "batch intake exceeded capacity despite the clamp"
            );
            if let Err(err) = ingested {
                tracing::error!(%err, pid, "global batch intake overflowed the clamp");
            }
        }
        Some(cut.immediate)
    }
}
