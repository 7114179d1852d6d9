//! Core identifier and status types shared across the scheduler.

use crate::util::arena::ArenaIndex;
use core::fmt;

/// Logical scheduler time. One tick elapses per dispatch round.
pub type Tick = u64;

/// Handle to a goroutine record in the scheduler arena.
///
/// The display id of a goroutine (the monotonically increasing `G{n}` number)
/// lives on the record itself; a `Gref` is only a handle for reaching it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Gref(pub ArenaIndex);

impl fmt::Debug for Gref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gref({}:{})", self.0.index(), self.0.generation())
    }
}

impl From<Gref> for ArenaIndex {
    fn from(g: Gref) -> Self {
        g.0
    }
}

/// Lifecycle status of a goroutine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoStatus {
    /// Runnable: waiting in a queue (or runnext, or the timer list).
    Ready,
    /// Currently held by the dispatch frame.
    Running,
    /// Finished; about to be destroyed.
    Done,
}

/// Lifecycle status of a processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcStatus {
    /// No local work; still eligible for one lookup per round.
    Idle,
    /// Actively dispatching.
    Running,
    /// On the pidle stack; skipped until woken.
    Parked,
}

/// Why a goroutine last yielded instead of completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YieldReason {
    /// Time-slice exhaustion (reserved; not produced by the current runner).
    TimeSlice,
    /// A preempt request was consumed at the safepoint.
    Preempt,
    /// Blocked in a syscall (reserved).
    Syscall,
    /// Blocked on I/O (reserved).
    Io,
    /// No yield recorded yet.
    Unknown,
}

impl fmt::Display for YieldReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::TimeSlice => "time-slice",
            Self::Preempt => "preempt",
            Self::Syscall => "syscall",
            Self::Io => "io",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Where the work finder obtained a goroutine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkSource {
    /// The processor's single-slot fast path.
    Runnext,
    /// The processor's local run queue (including freshly stolen work).
    Runq,
    /// The shared global run queue.
    Global,
}

impl fmt::Display for WorkSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Runnext => "runnext",
            Self::Runq => "runq",
            Self::Global => "global",
        };
        f.write_str(s)
    }
}

/// A goroutine returned by the work finder, tagged with its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkItem {
    /// The goroutine to dispatch.
    pub g: Gref,
    /// Which queue position produced it.
    pub src: WorkSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yield_reason_display_forms() {
        assert_eq!(YieldReason::Preempt.to_string(), "preempt");
        assert_eq!(YieldReason::TimeSlice.to_string(), "time-slice");
        assert_eq!(YieldReason::Unknown.to_string(), "unknown");
    }

    #[test]
    fn work_source_display_matches_trace_contract() {
        assert_eq!(WorkSource::Runnext.to_string(), "runnext");
        assert_eq!(WorkSource::Runq.to_string(), "runq");
        assert_eq!(WorkSource::Global.to_string(), "global");
    }
}
