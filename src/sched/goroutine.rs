//! The goroutine record.
//!
//! A goroutine (G) is an execution unit: identity, status, an optional task
//! function, and scheduling metadata. The `sched_link` field chains G's
//! intrusively through the global run queue and through transfer batches; it
//! is owned by whichever chain the G currently lives in and is `None` in
//! every other state.

use crate::types::{GoStatus, Gref, YieldReason};
use core::fmt;

/// A parameterless, synchronous task body. Called exactly once.
pub type TaskFn = Box<dyn FnOnce()>;

/// A goroutine record, stored in the scheduler arena.
pub struct Goroutine {
    id: u64,
    status: GoStatus,
    task: Option<TaskFn>,
    sched_link: Option<Gref>,
    preempt: bool,
    last_yield_reason: YieldReason,
}

impl Goroutine {
    /// Creates a runnable goroutine with the given display id and task.
    ///
    /// A `None` task produces a malformed G that transitions directly to
    /// `Done` when dispatched.
    #[must_use]
    pub fn new(id: u64, task: Option<TaskFn>) -> Self {
        Self {
            id,
            status: GoStatus::Ready,
            task,
            sched_link: None,
            preempt: false,
            last_yield_reason: YieldReason::Unknown,
        }
    }

    /// Returns the monotonically assigned display id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Returns the current status.
    #[inline]
    #[must_use]
    pub const fn status(&self) -> GoStatus {
        self.status
    }

    /// Sets the status.
    #[inline]
    pub fn set_status(&mut self, status: GoStatus) {
        self.status = status;
    }

    /// True if a task body is present.
    #[inline]
    #[must_use]
    pub const fn has_task(&self) -> bool {
        self.task.is_some()
    }

    /// Takes the task body out of the record for the exactly-once call.
    #[inline]
    pub fn take_task(&mut self) -> Option<TaskFn> {
        self.task.take()
    }

    /// Returns the intrusive scheduling link.
    #[inline]
    #[must_use]
    pub const fn link(&self) -> Option<Gref> {
        self.sched_link
    }

    /// Sets the intrusive scheduling link.
    #[inline]
    pub fn set_link(&mut self, next: Option<Gref>) {
        self.sched_link = next;
    }

    /// Clears the intrusive scheduling link, returning the old value.
    #[inline]
    pub fn take_link(&mut self) -> Option<Gref> {
        self.sched_link.take()
    }

    /// Requests a cooperative yield at the next safepoint.
    #[inline]
    pub fn request_preempt(&mut self) {
        self.preempt = true;
    }

    /// True if a preempt request is pending.
    #[inline]
    #[must_use]
    pub const fn preempt_requested(&self) -> bool {
        self.preempt
    }

    /// Consumes a pending preempt request.
    ///
    /// Returns true iff a request was pending; in that case the request is
    /// cleared and `Preempt` is recorded as the last yield reason. Otherwise
    /// the record is left untouched.
    pub fn consume_preempt(&mut self) -> bool {
        if !self.preempt {
            return false;
        }
        self.preempt = false;
        self.last_yield_reason = YieldReason::Preempt;
        true
    }

    /// Returns the reason recorded at the most recent yield.
    #[inline]
    #[must_use]
    pub const fn last_yield_reason(&self) -> YieldReason {
        self.last_yield_reason
    }

    /// True iff the G can actually execute: status `Ready` and a task present.
    #[inline]
    #[must_use]
    pub const fn is_execution_ready(&self) -> bool {
        matches!(self.status, GoStatus::Ready) && self.task.is_some()
    }
}

impl fmt::Debug for Goroutine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Goroutine")
            .field("id", &self.id)
            .field("status", &self.status)
            .field("has_task", &self.task.is_some())
            .field("link", &self.sched_link)
            .field("preempt", &self.preempt)
            .finish_non_exhaustive()
    }
}
