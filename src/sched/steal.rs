//! Work stealing.
//!
//! An otherwise-idle processor scans its peers from a random start index
//! and moves half of the first non-empty victim's local queue into its own.
//! Taking half keeps the victim productive and limits thrash; the thief
//! returns on its next idle to balance further if needed. The victim's
//! runnext is never stolen.

use crate::sched::Scheduler;
use crate::types::WorkItem;

impl Scheduler {
    /// Attempts to steal work for `thief`.
    ///
    /// Ring-scans the peers from a random start with a budget of
    /// `nprocs * steal_tries` candidates. Aborts when the thief has no free
    /// local slot. On a successful move, one goroutine is immediately taken
    /// from the thief's own queue and returned.
    pub(crate) fn steal_work(&mut self, thief: u32) -> Option<WorkItem> {
        let nproc = self.procs.len();
        if nproc < 2 {
            return None;
        }

        let start = self.rng.next_usize(nproc);
        let mut budget = nproc * self.config.steal_tries;
        let mut scanned: Vec<u32> = Vec::new();

        for step in 0..nproc {
            if budget == 0 {
                break;
            }
            let victim = ((start + step) % nproc) as u32;
            if victim == thief {
                continue;
            }
            budget -= 1;

            if self.procs[thief as usize].runq().available() == 0 {
                tracing::trace!(thief, "steal aborted: no free local slot");
                return None;
            }

            if !self.procs[victim as usize].runq().is_empty() {
                let moved = self.runqsteal(thief, victim);
                if moved > 0 {
                    if self.trace.enabled() {
                        self.trace
                            .emit(format!("[steal] P{thief} <- {moved} from P{victim}"));
                    }
                    tracing::debug!(thief, victim, moved, "steal succeeded");
                    return self.runqget(thief);
                }
            }
            scanned.push(victim);
        }

        if self.trace.enabled() {
            let path = scanned
                .iter()
                .map(|v| format!("P{v}"))
                .collect::<Vec<_>>()
                .join(" -> ");
            if path.is_empty() {
                self.trace
                    .emit(format!("[steal] P{thief} scan(start={start}): (all empty)"));
            } else {
                self.trace.emit(format!(
                    "[steal] P{thief} scan(start={start}): {path} (all empty)"
                ));
            }
        }
        None
    }

    /// Moves `min(victim_len / 2, thief_available)` goroutines from the
    /// front of `victim`'s local queue to the tail of `thief`'s, in order.
    ///
    /// Returns the number moved. The victim's runnext is left alone.
    pub(crate) fn runqsteal(&mut self, thief: u32, victim: u32) -> usize {
        let (t, v) = self.proc_pair_mut(thief as usize, victim as usize);
        let k = (v.runq().len() / 2).min(t.runq().available());
        for _ in 0..k {
            let g = v.runq_mut().pop_front().expect("victim length checked");
            let accepted = t.runq_mut().push_back(g);
            debug_assert!(accepted, "thief capacity checked");
        }
        k
    }
}
