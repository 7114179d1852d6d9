//! A miniature, single-threaded rendition of the Go runtime scheduler.
//!
//! `gmpsched` dispatches short, parameterless tasks ("goroutines") across a
//! fixed pool of logical processors, exercising the same data structures and
//! decision procedures a production work-stealing runtime uses:
//!
//! - a per-processor single-slot fast path (`runnext`),
//! - per-processor bounded local run queues,
//! - a shared global run queue with batch intake,
//! - a LIFO idle-processor parking stack with explicit wakeups,
//! - randomized work stealing across peers,
//! - cooperative safe-point preemption driven by a logical tick timeline,
//! - a tick-deadline timer list that unparks goroutines to the global queue.
//!
//! There is exactly one execution context: the dispatch loop. Delays are
//! expressed in scheduler ticks, not wall time. The atomic counters present
//! in the state (`npidle`, the goroutine id generator) document the contract
//! a future multi-context variant would rely on; in this crate they are only
//! ever touched from the dispatch context.
//!
//! # Example
//!
//! ```
//! use gmpsched::{SchedConfig, Scheduler};
//!
//! let mut sched = Scheduler::new(SchedConfig::with_procs(2)).unwrap();
//! sched.newproc_auto(Box::new(|| println!("hello")));
//! sched.schedule();
//! assert_eq!(sched.live_goroutines(), 0);
//! ```

pub mod config;
pub mod error;
pub mod sched;
pub mod trace;
pub mod types;
pub mod util;

pub use config::{ConfigError, ProcCountPolicy, SchedConfig};
pub use error::{Error, ErrorKind};
pub use sched::goroutine::TaskFn;
pub use sched::Scheduler;
pub use trace::TraceHandle;
pub use types::{Gref, Tick, WorkSource, YieldReason};
