//! # Deferred-call queue.
//!
//! [`EventQueue`] is a thread-guarded FIFO of deferred closures. Producers
//! push under the queue's own lock, which is independent of the dispatch
//! lock: queueing work never contends with a broadcast in progress, and
//! draining never blocks producers.
//!
//! ## Draining
//! [`EventQueue::execute`] swaps out the current backlog atomically and
//! invokes it in FIFO order **outside** the push-lock. A closure that queues
//! new work therefore neither deadlocks nor gets that work run in the same
//! pass: exactly one generation of backlog is drained per call.
//!
//! A closure that panics aborts the remainder of its own generation (the
//! swapped-out backlog is dropped during unwinding); the queue itself stays
//! structurally valid for the next `execute` call.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

/// A deferred closure: bound function plus captured arguments, consumed
/// exactly once.
pub(crate) type QueuedEntry = Box<dyn FnOnce() + Send>;

/// Thread-guarded FIFO of deferred closures.
pub(crate) struct EventQueue {
    backlog: Mutex<VecDeque<QueuedEntry>>,
    active: AtomicBool,
}

impl EventQueue {
    pub(crate) fn new(active: bool) -> Self {
        Self {
            backlog: Mutex::new(VecDeque::new()),
            active: AtomicBool::new(active),
        }
    }

    /// Whether the queue currently accepts work.
    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Switches acceptance of new work on or off. Already-queued entries are
    /// unaffected.
    pub(crate) fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }

    /// Appends an entry under the push-lock.
    pub(crate) fn push(&self, entry: QueuedEntry) {
        self.backlog.lock().push_back(entry);
    }

    /// Drains exactly one generation of backlog in FIFO order and returns the
    /// number of entries invoked.
    pub(crate) fn execute(&self) -> usize {
        let generation = std::mem::take(&mut *self.backlog.lock());
        let count = generation.len();
        for entry in generation {
            entry();
        }
        count
    }

    /// Drops the backlog without invoking it. Returns the number discarded.
    pub(crate) fn clear(&self) -> usize {
        let discarded = std::mem::take(&mut *self.backlog.lock());
        discarded.len()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.backlog.lock().len()
    }
}
