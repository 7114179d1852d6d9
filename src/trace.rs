//! Debug text interface.
//!
//! When debug mode is on, the scheduler narrates its decisions as plain text
//! lines (round headers, dispatch, parking, stealing, preemption). Snapshot
//! tests rely on the exact wording, so the lines are emitted through one
//! sink that both echoes to stdout and captures into a shared buffer.

use parking_lot::Mutex;
use std::sync::Arc;

/// Sink for the debug text interface.
///
/// Disabled sinks drop lines without formatting cost (callers gate on
/// [`TraceSink::enabled`] via the [`sched_trace!`](crate::sched_trace) macro).
#[derive(Debug, Clone)]
pub struct TraceSink {
    enabled: bool,
    echo: bool,
    lines: Arc<Mutex<Vec<String>>>,
}

impl TraceSink {
    /// Creates a sink. `enabled` controls capture, `echo` controls stdout.
    #[must_use]
    pub fn new(enabled: bool, echo: bool) -> Self {
        Self {
            enabled,
            echo,
            lines: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// True if lines should be formatted and emitted at all.
    #[inline]
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// Records one line, echoing it to stdout when configured.
    pub fn emit(&self, line: String) {
        if !self.enabled {
            return;
        }
        if self.echo {
            println!("{line}");
        }
        self.lines.lock().push(line);
    }

    /// Returns a capture handle for snapshot assertions.
    #[must_use]
    pub fn handle(&self) -> TraceHandle {
        TraceHandle {
            lines: Arc::clone(&self.lines),
        }
    }
}

/// Read-only handle to the captured debug lines.
#[derive(Debug, Clone)]
pub struct TraceHandle {
    lines: Arc<Mutex<Vec<String>>>,
}

impl TraceHandle {
    /// Returns a snapshot of every captured line, in emission order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Counts captured lines containing `needle`.
    #[must_use]
    pub fn count_containing(&self, needle: &str) -> usize {
        self.lines
            .lock()
            .iter()
            .filter(|line| line.contains(needle))
            .count()
    }

    /// True if any captured line contains `needle`.
    #[must_use]
    pub fn any_containing(&self, needle: &str) -> bool {
        self.count_containing(needle) > 0
    }
}

/// Emits one debug line through a [`TraceSink`], formatting only when the
/// sink is enabled.
#[macro_export]
macro_rules! sched_trace {
    ($sink:expr, $($arg:tt)*) => {
        if $sink.enabled() {
            $sink.emit(format!($($arg)*));
        }
    };
}
