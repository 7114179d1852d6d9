//! Demo harness for the gmpsched scheduler.
//!
//! Builds a workload of short tasks, spreads them across the processor pool
//! round-robin, and runs the dispatch loop to termination. With `--debug`
//! the scheduler narrates every decision.

use clap::{Parser, ValueEnum};
use gmpsched::{ProcCountPolicy, SchedConfig, Scheduler};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "gmpsched", version, about = "Miniature GMP scheduler demo")]
struct Cli {
    /// Processor-count policy: one-per-core, half, quarter, double, or a number
    #[arg(short = 'p', long = "procs", default_value = "one-per-core", value_parser = parse_policy)]
    procs: ProcCountPolicy,

    /// Number of goroutines to create
    #[arg(short = 'g', long = "goroutines", default_value_t = 16)]
    goroutines: usize,

    /// Workload to run
    #[arg(short = 'w', long = "workload", value_enum, default_value = "counter")]
    workload: Workload,

    /// Ticks between preempt-marking passes
    #[arg(long = "preempt-period", default_value_t = 7)]
    preempt_period: u64,

    /// Seed for the deterministic RNG
    #[arg(long = "seed", default_value_t = 1)]
    seed: u64,

    /// Park one goroutine on a 3-tick timer before scheduling
    #[arg(long = "timer-demo", action = clap::ArgAction::SetTrue)]
    timer_demo: bool,

    /// Emit the scheduler's debug narration
    #[arg(short = 'd', long = "debug", action = clap::ArgAction::SetTrue)]
    debug: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Workload {
    /// Every task bumps a shared counter.
    Counter,
    /// Every task prints a greeting.
    Greeting,
    /// Alternating counter bumps and greetings.
    Mixed,
}

fn parse_policy(s: &str) -> Result<ProcCountPolicy, String> {
    match s {
        "one-per-core" => Ok(ProcCountPolicy::OnePerCore),
        "half" => Ok(ProcCountPolicy::HalfCores),
        "quarter" => Ok(ProcCountPolicy::QuarterCores),
        "double" => Ok(ProcCountPolicy::DoubleCores),
        other => other
            .parse::<usize>()
            .map(ProcCountPolicy::Custom)
            .map_err(|_| format!("unknown policy '{other}'")),
    }
}

fn fail(message: &str) -> ! {
    eprintln!("\x1b[1;31merror:\x1b[0m {message}");
    std::process::exit(2);
}

type Task = Rc<dyn Fn()>;

fn build_tasks(workload: Workload, counter: &Arc<AtomicU64>) -> Vec<Task> {
    let bump: Task = {
        let c = Arc::clone(counter);
        Rc::new(move || {
            c.fetch_add(1, Ordering::Relaxed);
        })
    };
    let greet = |i: usize| -> Task {
        Rc::new(move || {
            println!("hello from task {i}");
        })
    };

    match workload {
        Workload::Counter => vec![bump],
        Workload::Greeting => (0..4).map(greet).collect(),
        Workload::Mixed => {
            vec![Rc::clone(&bump), greet(0), bump, greet(1)]
        }
    }
}

fn main() {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if cli.goroutines == 0 {
        fail("refusing to run with zero goroutines");
    }

    let counter = Arc::new(AtomicU64::new(0));
    let tasks = build_tasks(cli.workload, &counter);
    if tasks.is_empty() {
        fail("no task functions were provided");
    }

    let cores = std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
    let config = SchedConfig {
        preempt_period: cli.preempt_period,
        rng_seed: cli.seed,
        debug: cli.debug,
        ..SchedConfig::from_policy(cli.procs, cores)
    };

    let mut sched = match Scheduler::new(config) {
        Ok(sched) => sched,
        Err(err) => fail(&format!("invalid configuration: {err}")),
    };

    println!(
        "gmpsched: {} goroutine(s) over {} processor(s), workload {:?}",
        cli.goroutines,
        sched.nprocs(),
        cli.workload
    );

    let mut last = None;
    for i in 0..cli.goroutines {
        let task = Rc::clone(&tasks[i % tasks.len()]);
        last = Some(sched.newproc_auto(Box::new(move || task())));
    }

    if cli.timer_demo {
        if let Some(g) = last {
            sched.timer_park(g, 3);
            println!("gmpsched: parked the newest goroutine for 3 ticks");
        }
    }

    sched.schedule();

    println!(
        "gmpsched: done after {} tick(s); counter={} live={} idle={}",
        sched.ticks(),
        counter.load(Ordering::Relaxed),
        sched.live_goroutines(),
        sched.idle_count()
    );
}
