//! The scheduler core.
//!
//! [`Scheduler`] is the single aggregate all operation groups attach to:
//! queue plumbing in [`runq`], parking in [`pidle`], stealing in [`steal`],
//! the work finder in [`finder`], the runner in [`runner`], the tick
//! timeline in [`timer`], goroutine lifecycle in [`lifecycle`], and the
//! dispatch loop in [`dispatch`]. Each file contributes one `impl Scheduler`
//! block; there is no runtime dispatch between them.

pub mod dispatch;
pub mod finder;
pub mod global_queue;
pub mod goroutine;
pub mod lifecycle;
pub mod local_queue;
pub mod pidle;
pub mod proc;
pub mod runner;
pub mod runq;
pub mod steal;
pub mod timer;

use crate::config::{ConfigError, SchedConfig};
use crate::sched::global_queue::GlobalQueue;
use crate::sched::goroutine::Goroutine;
use crate::sched::proc::Proc;
use crate::sched::timer::TimerEntry;
use crate::trace::{TraceHandle, TraceSink};
use crate::types::{Gref, Tick};
use crate::util::arena::Arena;
use crate::util::det_rng::DetRng;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Optional dispatch-time preempt-injection hook.
///
/// Invoked with the goroutine's display id just before the executor runs a
/// slice; returning true requests a preempt for that dispatch. Reserved so
/// the periodic preempt pass can be supplemented by dispatch-time policies
/// without touching the runner. No default policy installs one.
pub type PreemptInjectHook = fn(u64) -> bool;

/// The scheduler state root.
///
/// Owns the processor array, the global run queue, the idle-processor stack,
/// the tick timeline and timer list, the goroutine arena, and the debug
/// trace sink.
///
/// `npidle` and `goidgen` are atomics to document the contract a
/// multi-context variant would rely on; in this single-context scheduler
/// they are only ever touched from the dispatch context.
pub struct Scheduler {
    config: SchedConfig,
    procs: Vec<Proc>,
    global: GlobalQueue,
    arena: Arena<Goroutine>,
    pidle_head: Option<u32>,
    npidle: AtomicUsize,
    goidgen: AtomicU64,
    ticks: Tick,
    next_preempt_tick: Tick,
    timers: Vec<TimerEntry>,
    rr_cursor: usize,
    main_started: bool,
    rng: DetRng,
    trace: TraceSink,
    preempt_inject_hook: Option<PreemptInjectHook>,
}

impl Scheduler {
    /// Creates a scheduler from a validated configuration.
    pub fn new(config: SchedConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let procs = (0..config.nprocs)
            .map(|pid| Proc::new(pid as u32, config.local_queue_cap))
            .collect();
        let trace = TraceSink::new(config.debug, config.debug && config.trace_echo);
        Ok(Self {
            rng: DetRng::new(config.rng_seed),
            next_preempt_tick: config.preempt_period,
            config,
            procs,
            global: GlobalQueue::new(),
            arena: Arena::new(),
            pidle_head: None,
            npidle: AtomicUsize::new(0),
            goidgen: AtomicU64::new(1),
            ticks: 0,
            timers: Vec::new(),
            rr_cursor: 0,
            main_started: false,
            trace,
            preempt_inject_hook: None,
        })
    }

    /// Returns the logical processor count.
    #[must_use]
    pub fn nprocs(&self) -> usize {
        self.procs.len()
    }

    /// Returns the current logical tick.
    #[must_use]
    pub const fn ticks(&self) -> Tick {
        self.ticks
    }

    /// Returns the global run queue length.
    #[must_use]
    pub const fn global_len(&self) -> usize {
        self.global.len()
    }

    /// Returns the number of parked processors.
    #[must_use]
    pub fn idle_count(&self) -> usize {
        self.npidle.load(Ordering::Relaxed)
    }

    /// Returns the number of live (not yet destroyed) goroutines.
    #[must_use]
    pub fn live_goroutines(&self) -> usize {
        self.arena.len()
    }

    /// Returns the number of pending timer entries.
    #[must_use]
    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    /// Returns a handle to the captured debug trace lines.
    #[must_use]
    pub fn trace_handle(&self) -> TraceHandle {
        self.trace.handle()
    }

    /// Installs the optional dispatch-time preempt-injection hook.
    pub fn set_preempt_inject_hook(&mut self, hook: PreemptInjectHook) {
        self.preempt_inject_hook = Some(hook);
    }

    /// Mutably borrows two distinct processors by index.
    ///
    /// # Panics
    ///
    /// Panics if `a == b` or either index is out of range.
    pub(crate) fn proc_pair_mut(&mut self, a: usize, b: usize) -> (&mut Proc, &mut Proc) {
        assert_ne!(a, b, "cannot borrow the same processor twice");
        if a < b {
            let (lo, hi) = self.procs.split_at_mut(b);
            (&mut lo[a], &mut hi[0])
        } else {
            let (lo, hi) = self.procs.split_at_mut(a);
            (&mut hi[0], &mut lo[b])
        }
    }

    /// Destroys every goroutine still held by any of the five holders:
    /// runnext slots, local queues, the global queue, the timer list, and
    /// (vacuously, outside a dispatch frame) the runner.
    ///
    /// Returns the number of records destroyed.
    pub(crate) fn destroy_residual(&mut self) -> usize {
        let mut residual: Vec<Gref> = Vec::new();
        for p in &mut self.procs {
            if let Some(g) = p.take_runnext() {
                residual.push(g);
            }
            residual.extend(p.runq().iter().collect::<Vec<_>>());
            p.runq_mut().clear();
        }
        residual.extend(self.global.drain(&mut self.arena));
        residual.extend(self.timers.drain(..).map(|entry| entry.g));

        let mut destroyed = 0;
        for g in residual {
            if self.arena.remove(g.0).is_some() {
                destroyed += 1;
            }
        }

        // Anything still live was reachable from none of the five holders.
        let leftovers = self.arena.live_indices();
        debug_assert!(leftovers.is_empty(), "goroutine record leaked its holder");
        for idx in leftovers {
            if self.arena.remove(idx).is_some() {
                destroyed += 1;
            }
        }
        destroyed
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        let _ = self.destroy_residual();
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("nprocs", &self.procs.len())
            .field("ticks", &self.ticks)
            .field("global_len", &self.global.len())
            .field("npidle", &self.idle_count())
            .field("live", &self.arena.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedConfig;

    fn quiet_config(nprocs: usize) -> SchedConfig {
        SchedConfig {
            nprocs,
            debug: true,
            trace_echo: false,
            ..SchedConfig::default()
        }
    }

    #[test]
    fn new_scheduler_starts_cold() {
        let sched = Scheduler::new(quiet_config(4)).expect("valid config");
        assert_eq!(sched.nprocs(), 4);
        assert_eq!(sched.ticks(), 0);
        assert_eq!(sched.global_len(), 0);
        assert_eq!(sched.idle_count(), 0);
        assert_eq!(sched.live_goroutines(), 0);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = SchedConfig::with_procs(0);
        assert!(Scheduler::new(cfg).is_err());
    }

    #[test]
    fn proc_pair_mut_returns_distinct_lanes() {
        let mut sched = Scheduler::new(quiet_config(3)).expect("valid config");
        let (a, b) = sched.proc_pair_mut(2, 0);
        assert_eq!(a.pid(), 2);
        assert_eq!(b.pid(), 0);
    }

    #[test]
    fn destroy_residual_walks_every_holder() {
        let mut sched = Scheduler::new(quiet_config(2)).expect("valid config");
        // One G per holder: runnext, local queue, global queue, timer list.
        let in_runnext = sched.newproc(0, Box::new(|| {}));
        let in_runq = sched.newproc(0, Box::new(|| {}));
        let in_global = sched.newproc(1, Box::new(|| {}));
        let in_timers = sched.newproc(1, Box::new(|| {}));

        // `in_runq` was demoted to the local queue by the second newproc.
        assert_ne!(in_runnext, in_runq);
        // Move one to the global queue and one to the timer list.
        assert!(sched.detach_from_queues(in_global));
        sched.globrunqput(in_global);
        sched.timer_park(in_timers, 10);

        assert_eq!(sched.live_goroutines(), 4);
        let destroyed = sched.destroy_residual();
        assert_eq!(destroyed, 4, "all four holders must be drained");
        assert_eq!(sched.live_goroutines(), 0);
    }
}
