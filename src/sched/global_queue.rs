//! Shared global run queue.
//!
//! An unbounded FIFO chained intrusively through each goroutine's scheduling
//! link: head, tail, and length, with O(1) single enqueue/dequeue and an
//! O(k) head cut for batch intake. Enqueue clears the incoming link first,
//! so the last node's link is always null.

use crate::sched::goroutine::Goroutine;
use crate::types::Gref;
use crate::util::arena::Arena;

/// A batch cut from the head of the global queue.
///
/// `immediate` is the first element, destined for direct execution;
/// `chain_head` starts a detached chain of `chain_len` further elements
/// still linked through their scheduling links.
#[derive(Debug, Clone, Copy)]
pub struct BatchCut {
    /// First element of the cut.
    pub immediate: Gref,
    /// Head of the remaining detached chain, if any.
    pub chain_head: Option<Gref>,
    /// Number of elements in the detached chain (`k - 1`).
    pub chain_len: usize,
}

/// The global run queue.
#[derive(Debug, Default)]
pub struct GlobalQueue {
    head: Option<Gref>,
    tail: Option<Gref>,
    len: usize,
}

impl GlobalQueue {
    /// Creates an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Returns the number of queued goroutines.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// True if nothing is queued.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Enqueues one goroutine at the tail.
    ///
    /// The G's scheduling link is cleared before it is chained.
    pub fn push_back(&mut self, g: Gref, arena: &mut Arena<Goroutine>) {
        if let Some(record) = arena.get_mut(g) {
            record.set_link(None);
        } else {
            debug_assert!(false, "enqueued a dead goroutine handle");
            return;
        }
        match self.tail {
            Some(tail) => {
                if let Some(record) = arena.get_mut(tail) {
                    record.set_link(Some(g));
                }
            }
            None => {
                debug_assert!(self.head.is_none(), "tailless queue must be headless");
                self.head = Some(g);
            }
        }
        self.tail = Some(g);
        self.len += 1;
    }

    /// Enqueues a slice of goroutines at the tail, in slice order.
    pub fn push_batch(&mut self, batch: &[Gref], arena: &mut Arena<Goroutine>) {
        for &g in batch {
            self.push_back(g, arena);
        }
    }

    /// Dequeues one goroutine from the head.
    pub fn pop_front(&mut self, arena: &mut Arena<Goroutine>) -> Option<Gref> {
        let head = self.head?;
        let next = arena.get_mut(head).and_then(Goroutine::take_link);
        self.head = next;
        if next.is_none() {
            self.tail = None;
        }
        self.len -= 1;
        Some(head)
    }

    /// Cuts `k` goroutines from the head.
    ///
    /// Returns the first element for immediate execution plus a detached
    /// chain of the next `k - 1`. When `k` equals the current length the cut
    /// is O(1) (take-all fast path); otherwise O(k).
    ///
    /// Returns `None` when the queue is empty or `k` is zero. `k` larger
    /// than the length is clamped.
    pub fn cut_front(&mut self, k: usize, arena: &mut Arena<Goroutine>) -> Option<BatchCut> {
        if k == 0 || self.len == 0 {
            return None;
        }
        let k = k.min(self.len);

        if k == self.len {
            // Take-all fast path: hand over the whole chain in O(1).
            let immediate = self.head.take().expect("non-empty queue has a head");
            self.tail = None;
            self.len = 0;
            let chain_head = arena.get_mut(immediate).and_then(Goroutine::take_link);
            return Some(BatchCut {
                immediate,
                chain_head,
                chain_len: k - 1,
            });
        }

        let immediate = self.pop_front(arena).expect("len checked above");
        let chain_len = k - 1;
        if chain_len == 0 {
            return Some(BatchCut {
                immediate,
                chain_head: None,
                chain_len: 0,
            });
        }

        // Detach the next chain_len nodes: walk to the cut point, sever it.
        let chain_head = self.head;
        let mut last = chain_head.expect("k < len implies more nodes");
        for _ in 1..chain_len {
            last = arena
                .get(last)
                .and_then(Goroutine::link)
                .expect("chain shorter than recorded length");
        }
        let rest = arena.get_mut(last).and_then(Goroutine::take_link);
        debug_assert!(rest.is_some(), "k < len leaves a non-empty remainder");
        self.head = rest;
        self.len -= chain_len;

        Some(BatchCut {
            immediate,
            chain_head,
            chain_len,
        })
    }

    /// Unlinks the first occurrence of `g` from the chain.
    ///
    /// O(n); only used by the timer-park detach path, never by dispatch.
    pub fn remove(&mut self, g: Gref, arena: &mut Arena<Goroutine>) -> bool {
        let mut prev: Option<Gref> = None;
        let mut cursor = self.head;
        while let Some(cur) = cursor {
            if cur == g {
                let next = arena.get_mut(cur).and_then(Goroutine::take_link);
                match prev {
                    Some(prev) => {
                        if let Some(record) = arena.get_mut(prev) {
                            record.set_link(next);
                        }
                    }
                    None => self.head = next,
                }
                if self.tail == Some(cur) {
                    self.tail = prev;
                }
                self.len -= 1;
                return true;
            }
            prev = cursor;
            cursor = arena.get(cur).and_then(Goroutine::link);
        }
        false
    }

    /// Drains every queued goroutine into a vector (teardown helper).
    pub fn drain(&mut self, arena: &mut Arena<Goroutine>) -> Vec<Gref> {
        let mut all = Vec::with_capacity(self.len);
        while let Some(g) = self.pop_front(arena) {
            all.push(g);
        }
        all
    }
}
