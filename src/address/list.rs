//! # Handler list for one bus address.
//!
//! [`HandlerList`] is an insertion-ordered collection of handler references.
//! Each connected handler occupies a slot; slots are assigned from a
//! monotonically increasing counter, so the entry vector is always sorted by
//! slot and insertion order *is* slot order.
//!
//! ## Iteration discipline
//! Dispatch never iterates the live vector. It takes a [`snapshot`] (a clone
//! of the `(slot, Arc)` pairs) under a short lock held by the owner, then for
//! each snapshot entry re-checks [`contains`] immediately before invoking.
//! This is what makes connect/disconnect during a dispatch safe:
//!
//! - a handler disconnected mid-dispatch (itself included) is never invoked
//!   after its removal, and removing it never skips or repeats any *other*
//!   handler;
//! - a handler connected mid-dispatch is not visited by the in-flight
//!   snapshot (callers must not rely on either behavior).
//!
//! [`snapshot`]: HandlerList::snapshot
//! [`contains`]: HandlerList::contains

use std::sync::Arc;

/// One connected handler: its slot plus a shared reference to it.
struct Entry<H: ?Sized> {
    slot: u64,
    handler: Arc<H>,
}

/// Insertion-ordered handlers at one address.
///
/// The list holds `Arc` clones of the handlers; a handler stays alive at
/// least as long as any in-flight snapshot that reaches it, even if it is
/// disconnected concurrently.
pub(crate) struct HandlerList<H: ?Sized> {
    entries: Vec<Entry<H>>,
    next_slot: u64,
}

impl<H: ?Sized> HandlerList<H> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_slot: 0,
        }
    }

    /// Appends a handler and returns its slot. O(1) amortized.
    pub(crate) fn insert(&mut self, handler: Arc<H>) -> u64 {
        let slot = self.next_slot;
        self.next_slot += 1;
        self.entries.push(Entry { slot, handler });
        slot
    }

    /// Removes the handler at `slot`. Returns `false` if it was already gone.
    pub(crate) fn remove(&mut self, slot: u64) -> bool {
        match self.entries.binary_search_by_key(&slot, |e| e.slot) {
            Ok(idx) => {
                self.entries.remove(idx);
                true
            }
            Err(_) => false,
        }
    }

    /// Whether `slot` is still connected.
    pub(crate) fn contains(&self, slot: u64) -> bool {
        self.entries.binary_search_by_key(&slot, |e| e.slot).is_ok()
    }

    /// Clones the current `(slot, handler)` pairs in insertion order.
    pub(crate) fn snapshot(&self) -> Vec<(u64, Arc<H>)> {
        self.entries
            .iter()
            .map(|e| (e.slot, Arc::clone(&e.handler)))
            .collect()
    }

    /// The first connected handler in insertion order, if any.
    pub(crate) fn first(&self) -> Option<Arc<H>> {
        self.entries.first().map(|e| Arc::clone(&e.handler))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
