//! The logical processor record.
//!
//! A processor (P) is a scheduler lane: a single-slot `runnext` fast path, a
//! bounded local run queue, a status, and an intrusive link for membership
//! on the idle stack.

use crate::sched::local_queue::RunQueue;
use crate::types::{Gref, ProcStatus};

/// A logical processor.
#[derive(Debug)]
pub struct Proc {
    pid: u32,
    status: ProcStatus,
    runnext: Option<Gref>,
    runq: RunQueue,
    idle_link: Option<u32>,
}

impl Proc {
    /// Creates an idle processor with an empty local queue.
    #[must_use]
    pub fn new(pid: u32, local_capacity: usize) -> Self {
        Self {
            pid,
            status: ProcStatus::Idle,
            runnext: None,
            runq: RunQueue::new(local_capacity),
            idle_link: None,
        }
    }

    /// Returns the processor id.
    #[inline]
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// Returns the current status.
    #[inline]
    #[must_use]
    pub const fn status(&self) -> ProcStatus {
        self.status
    }

    /// Sets the status.
    #[inline]
    pub fn set_status(&mut self, status: ProcStatus) {
        self.status = status;
    }

    /// Returns the runnext slot without consuming it.
    #[inline]
    #[must_use]
    pub const fn runnext(&self) -> Option<Gref> {
        self.runnext
    }

    /// True if the fast path is occupied.
    #[inline]
    #[must_use]
    pub const fn has_runnext(&self) -> bool {
        self.runnext.is_some()
    }

    /// Installs `g` in the fast path, returning the displaced occupant.
    #[inline]
    pub fn set_runnext(&mut self, g: Gref) -> Option<Gref> {
        self.runnext.replace(g)
    }

    /// Takes the fast-path occupant, leaving the slot empty.
    #[inline]
    pub fn take_runnext(&mut self) -> Option<Gref> {
        self.runnext.take()
    }

    /// Shared access to the local run queue.
    #[inline]
    #[must_use]
    pub const fn runq(&self) -> &RunQueue {
        &self.runq
    }

    /// Mutable access to the local run queue.
    #[inline]
    pub fn runq_mut(&mut self) -> &mut RunQueue {
        &mut self.runq
    }

    /// True if the fast path or the local queue holds anything.
    #[inline]
    #[must_use]
    pub fn has_work(&self) -> bool {
        self.runnext.is_some() || !self.runq.is_empty()
    }

    /// Total goroutines attached to this processor (queue plus fast path).
    #[inline]
    #[must_use]
    pub fn total_goroutines(&self) -> usize {
        self.runq.len() + usize::from(self.runnext.is_some())
    }

    /// Returns the next local candidate (runnext, else the queue front)
    /// without consuming it. The preemption pass peeks through this.
    #[inline]
    #[must_use]
    pub fn preview_local_next(&self) -> Option<Gref> {
        self.runnext.or_else(|| self.runq.front())
    }

    /// Returns the intrusive idle-stack link.
    #[inline]
    #[must_use]
    pub const fn idle_link(&self) -> Option<u32> {
        self.idle_link
    }

    /// Sets the intrusive idle-stack link.
    #[inline]
    pub fn set_idle_link(&mut self, next: Option<u32>) {
        self.idle_link = next;
    }

    /// Demotes `Running` to `Idle` when no local work remains.
    ///
    /// Never touches `Parked`, and never promotes `Idle` to `Running`; the
    /// only promotion paths are dispatch and `pidle_get`.
    pub fn sync_status(&mut self) {
        if self.status == ProcStatus::Running && !self.has_work() {
            self.status = ProcStatus::Idle;
        }
    }
}
