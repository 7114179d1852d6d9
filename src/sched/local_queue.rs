//! Bounded per-processor run queue.
//!
//! A fixed-capacity circular buffer of goroutine handles with O(1) enqueue,
//! dequeue, and size. Enqueue on a full queue is a signaled failure; the
//! caller handles it by spilling half the queue to the global run queue.

use crate::error::{Error, ErrorKind};
use crate::sched::goroutine::Goroutine;
use crate::types::Gref;
use crate::util::arena::Arena;

/// A bounded circular FIFO of goroutine handles.
#[derive(Debug)]
pub struct RunQueue {
    slots: Box<[Option<Gref>]>,
    head: usize,
    len: usize,
}

impl RunQueue {
    /// Creates a queue with the given fixed capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity].into_boxed_slice(),
            head: 0,
            len: 0,
        }
    }

    /// Returns the fixed capacity.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
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

    /// True if no slot is free.
    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Returns the number of free slots.
    #[inline]
    #[must_use]
    pub fn available(&self) -> usize {
        self.capacity() - self.len
    }

    /// True if at least one slot is free.
    #[inline]
    #[must_use]
    pub fn has_capacity(&self) -> bool {
        self.len < self.capacity()
    }

    /// Enqueues at the tail. Returns false (leaving the caller owning `g`)
    /// when the queue is full.
    #[must_use]
    pub fn push_back(&mut self, g: Gref) -> bool {
        if self.is_full() {
            return false;
        }
        let tail = (self.head + self.len) % self.capacity();
        self.slots[tail] = Some(g);
        self.len += 1;
        true
    }

    /// Dequeues from the front.
    #[must_use]
    pub fn pop_front(&mut self) -> Option<Gref> {
        if self.len == 0 {
            return None;
        }
        let g = self.slots[self.head].take();
        debug_assert!(g.is_some(), "occupied head slot was empty");
        self.head = (self.head + 1) % self.capacity();
        self.len -= 1;
        g
    }

    /// Returns the front element without consuming it.
    #[inline]
    #[must_use]
    pub fn front(&self) -> Option<Gref> {
        if self.len == 0 {
            None
        } else {
            self.slots[self.head]
        }
    }

    /// Removes every element.
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }

    /// Removes the first occurrence of `g`, preserving the order of the
    /// remaining elements. Returns true if it was present.
    ///
    /// O(n); only used by the timer-park detach path, never by dispatch.
    pub fn remove(&mut self, g: Gref) -> bool {
        let cap = self.capacity();
        let mut found = None;
        for i in 0..self.len {
            let idx = (self.head + i) % cap;
            if self.slots[idx] == Some(g) {
                found = Some(i);
                break;
            }
        }
        let Some(at) = found else {
            return false;
        };
        // Shift successors forward one slot.
        for i in at..self.len - 1 {
            let cur = (self.head + i) % cap;
            let next = (self.head + i + 1) % cap;
            self.slots[cur] = self.slots[next].take();
        }
        let last = (self.head + self.len - 1) % cap;
        self.slots[last] = None;
        self.len -= 1;
        true
    }

    /// Enqueues a detached intrusive chain in chain order, clearing each
    /// link as it is enqueued.
    ///
    /// On capacity exhaustion mid-batch the already-enqueued prefix stays in
    /// the queue, the failing element keeps its link to the remainder, and a
    /// `LocalQueueFull` error is returned. Callers that pre-clamp to
    /// available capacity treat that as an invariant violation.
    pub fn ingest_chain(
        &mut self,
        chain_head: Option<Gref>,
        arena: &mut Arena<Goroutine>,
    ) -> Result<(), Error> {
        let mut cursor = chain_head;
        while let Some(g) = cursor {
            if !self.has_capacity() {
                return Err(Error::new(ErrorKind::LocalQueueFull));
            }
            let next = arena
                .get_mut(g)
                .and_then(Goroutine::take_link);
            let accepted = self.push_back(g);
            debug_assert!(accepted, "capacity checked before push");
            cursor = next;
        }
        Ok(())
    }

    /// Iterates the queued handles front-to-back (test and teardown helper).
    pub fn iter(&self) -> impl Iterator<Item = Gref> + '_ {
        let cap = self.capacity();
        (0..self.len).filter_map(move |i| self.slots[(self.head + i) % cap])
    }
}
