//! End-to-end scheduler scenarios over the public API.
//!
//! Each test drives a whole scheduling run and asserts on observable
//! behavior: completion counters, residual state, and the debug trace lines
//! the scheduler is contracted to emit.

use gmpsched::{SchedConfig, Scheduler, TaskFn};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn quiet(nprocs: usize) -> SchedConfig {
    SchedConfig {
        nprocs,
        debug: true,
        trace_echo: false,
        ..SchedConfig::default()
    }
}

fn bump(counter: &Arc<AtomicUsize>) -> TaskFn {
    let c = Arc::clone(counter);
    Box::new(move || {
        c.fetch_add(1, Ordering::Relaxed);
    })
}

// Scenario: a single goroutine on a single processor runs from runnext and
// the loop terminates with the processor parked.
#[test]
fn single_goroutine_single_proc() {
    let output = Arc::new(Mutex::new(Vec::new()));
    let mut sched = Scheduler::new(quiet(1)).expect("valid config");
    {
        let out = Arc::clone(&output);
        sched.newproc(
            0,
            Box::new(move || {
                out.lock().unwrap().push("hello".to_string());
            }),
        );
    }
    sched.schedule();

    assert_eq!(output.lock().unwrap().as_slice(), ["hello"]);
    assert_eq!(sched.live_goroutines(), 0);
    assert_eq!(sched.idle_count(), 1);
    assert_eq!(sched.global_len(), 0);

    let trace = sched.trace_handle();
    assert_eq!(trace.count_containing("Executing"), 1, "exactly one dispatch");
    assert_eq!(trace.count_containing("G1 done"), 1);
    assert!(trace.any_containing("P0: Executing G1 (from runnext)"));
}

// Scenario: 260 goroutines aimed at one processor overflow the 256-slot
// local queue; the first spill moves 128 + 1 goroutines to the global queue
// in one batch, and everything still completes.
#[test]
fn overflow_spills_half_to_global() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut sched = Scheduler::new(quiet(1)).expect("valid config");
    for _ in 0..260 {
        sched.newproc(0, bump(&counter));
    }

    assert_eq!(sched.live_goroutines(), 260);
    assert_eq!(
        sched.global_len(),
        129,
        "one spill of 128 plus the overflowing goroutine"
    );

    sched.schedule();
    assert_eq!(counter.load(Ordering::Relaxed), 260);
    assert_eq!(sched.live_goroutines(), 0);
    assert_eq!(sched.idle_count(), 1);

    // The freshest goroutine owns the fast path when the loop starts.
    let first_dispatch = sched
        .trace_handle()
        .snapshot()
        .iter()
        .find(|l| l.contains("Executing"))
        .cloned()
        .expect("at least one dispatch");
    assert_eq!(first_dispatch, "P0: Executing G260 (from runnext)");
}

// Scenario: five processors, all 200 goroutines targeted at P0; the other
// processors bootstrap themselves through work stealing.
#[test]
fn stealing_balances_a_loaded_proc() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut sched = Scheduler::new(quiet(5)).expect("valid config");
    for _ in 0..200 {
        sched.newproc(0, bump(&counter));
    }

    sched.schedule();
    assert_eq!(counter.load(Ordering::Relaxed), 200);
    assert_eq!(sched.live_goroutines(), 0);
    assert_eq!(sched.idle_count(), 5);

    let trace = sched.trace_handle();
    assert!(
        trace.count_containing(" from P0") >= 1,
        "someone must steal from the loaded processor"
    );
    assert!(trace.count_containing("[steal] P") >= 1);
}

// Scenario: the preemption pass converts a dispatch into a safepoint yield;
// the task is not called on that dispatch, and the goroutine completes on a
// later one.
#[test]
fn preemption_yields_then_completes() {
    let counter = Arc::new(AtomicUsize::new(0));
    let cfg = SchedConfig {
        preempt_period: 2,
        ..quiet(1)
    };
    let mut sched = Scheduler::new(cfg).expect("valid config");
    for _ in 0..4 {
        sched.newproc(0, bump(&counter));
    }
    sched.schedule();

    assert_eq!(counter.load(Ordering::Relaxed), 4, "every task still runs");
    assert_eq!(sched.live_goroutines(), 0);

    let trace = sched.trace_handle();
    assert!(
        trace.count_containing("[preemptor] mark G") >= 1,
        "the pass must mark at least one candidate"
    );
    assert!(
        trace.count_containing("(preempt) -> tail") >= 1,
        "a marked goroutine must yield at the safepoint"
    );
}

// Scenario: a goroutine parked on a 3-tick timer fires back into the global
// queue with a wake and completes alongside the undelayed one.
#[test]
fn timer_wake_runs_parked_goroutine() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut sched = Scheduler::new(quiet(2)).expect("valid config");
    let _runner = sched.newproc_auto(bump(&counter));
    let sleeper = sched.newproc_auto(bump(&counter));
    sched.timer_park(sleeper, 3);

    sched.schedule();
    assert_eq!(counter.load(Ordering::Relaxed), 2);
    assert_eq!(sched.live_goroutines(), 0);
    assert!(sched.ticks() >= 3, "the loop must reach the deadline");
    assert_eq!(sched.idle_count(), 2);

    let trace = sched.trace_handle();
    assert_eq!(trace.count_containing("G2 done"), 1, "sleeper completed");
    assert!(
        trace.count_containing("[pidle] -P") >= 1,
        "the timer fire must wake a parked processor"
    );
}

// Scenario: no goroutines at all; every processor parks on the first pass
// and the loop exits without dispatching anything.
#[test]
fn no_tasks_teardown() {
    let mut sched = Scheduler::new(quiet(3)).expect("valid config");
    sched.schedule();

    assert_eq!(sched.idle_count(), 3);
    assert_eq!(sched.global_len(), 0);
    assert_eq!(sched.live_goroutines(), 0);
    assert!(sched.ticks() >= 1);

    let trace = sched.trace_handle();
    assert_eq!(trace.count_containing("Executing"), 0, "no G ever executed");
    assert_eq!(trace.count_containing("[pidle] +P"), 3);
    assert_eq!(trace.count_containing("--- Round"), 1, "one dispatching round");
}

// Termination property: large mixed workloads always drain completely.
#[test]
fn large_workload_terminates_without_leaks() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut sched = Scheduler::new(quiet(8)).expect("valid config");
    for _ in 0..500 {
        sched.newproc_auto(bump(&counter));
    }
    // A few stragglers on timers of varying depth.
    for delay in [1, 4, 9] {
        let g = sched.newproc_auto(bump(&counter));
        sched.timer_park(g, delay);
    }

    sched.schedule();
    assert_eq!(counter.load(Ordering::Relaxed), 503);
    assert_eq!(sched.live_goroutines(), 0, "no goroutine may leak");
    assert_eq!(sched.global_len(), 0);
    assert_eq!(sched.idle_count(), 8);
}

// Determinism: identical configs and workloads produce identical traces.
#[test]
fn same_seed_same_trace() {
    let run = || {
        let counter = Arc::new(AtomicUsize::new(0));
        let cfg = SchedConfig {
            rng_seed: 1234,
            ..quiet(4)
        };
        let mut sched = Scheduler::new(cfg).expect("valid config");
        for _ in 0..100 {
            sched.newproc_auto(bump(&counter));
        }
        sched.schedule();
        sched.trace_handle().snapshot()
    };

    assert_eq!(run(), run(), "scheduling must be reproducible");
}

// Creating work after a completed run restarts cleanly: newproc wakes a
// parked processor and a second schedule drains it.
#[test]
fn reschedule_after_completion() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut sched = Scheduler::new(quiet(2)).expect("valid config");
    sched.newproc_auto(bump(&counter));
    sched.schedule();
    assert_eq!(counter.load(Ordering::Relaxed), 1);

    sched.newproc_auto(bump(&counter));
    assert!(sched.idle_count() < 2, "new work must wake a parked P");
    sched.schedule();
    assert_eq!(counter.load(Ordering::Relaxed), 2);
    assert_eq!(sched.live_goroutines(), 0);
    assert_eq!(sched.idle_count(), 2);
}

// Goroutine ids keep increasing across the scheduler's whole lifetime.
#[test]
fn goroutine_ids_are_stable_across_runs() {
    let mut sched = Scheduler::new(quiet(1)).expect("valid config");
    sched.newproc(0, Box::new(|| {}));
    sched.schedule();
    sched.newproc(0, Box::new(|| {}));
    sched.schedule();

    let trace = sched.trace_handle();
    assert!(trace.any_containing("G1 done"));
    assert!(trace.any_containing("G2 done"), "id generator never resets");
}
