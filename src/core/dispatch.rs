//! # Dispatch algorithms.
//!
//! All delivery paths funnel through here: addressed events, broadcasts,
//! their result-collecting and reverse-ordered variants, and the read-only
//! enumeration walks. Queued calls re-enter these same paths when the queue
//! is drained.
//!
//! ## Walk discipline
//! Every walk acquires the dispatch lock first, pins the node(s) it is about
//! to visit (`Arc` clones taken under a short container lock), snapshots each
//! node's handler list, and re-checks each snapshot entry's liveness
//! immediately before invoking it. Consequences:
//!
//! - dispatching with zero handlers anywhere is a no-op that returns `None`
//!   for result variants;
//! - a handler that disconnects itself (or any other handler) mid-walk never
//!   causes another handler to be skipped or invoked twice;
//! - structural changes to the container mid-broadcast cannot invalidate the
//!   walk: every node to be visited is already pinned, reverse order
//!   included;
//! - result variants are last-handler-wins; there is no first-wins or reduce
//!   policy.
//!
//! The dispatch lock is held across handler invocations and released by RAII
//! on every exit path, unwinding included. Handler panics are never caught
//! here; they propagate to the original caller.

use std::sync::Arc;

use crate::address::AddressNode;
use crate::bus::BusId;

use super::BusContext;

impl<H: ?Sized, I: BusId> BusContext<H, I> {
    /// Invokes `op` on every handler at `id`, in insertion order (or its
    /// reverse). Returns the last invocation's result, `None` when no
    /// handler was invoked.
    pub(crate) fn dispatch_event<R>(
        &self,
        id: &I,
        reverse: bool,
        op: &mut dyn FnMut(&H) -> R,
    ) -> Option<R> {
        let _guard = self.lock().lock();
        let node = self.addresses().read().find(id)?;
        run_node(&node, reverse, op)
    }

    /// Same as [`dispatch_event`](Self::dispatch_event) but for an
    /// already-resolved node (cached address pointer path). Skipping the id
    /// lookup is strictly an optimization; order and results are identical.
    pub(crate) fn dispatch_node<R>(
        &self,
        node: &AddressNode<H, I>,
        reverse: bool,
        op: &mut dyn FnMut(&H) -> R,
    ) -> Option<R> {
        let _guard = self.lock().lock();
        run_node(node, reverse, op)
    }

    /// Invokes `op` on every handler at every address, in container order
    /// (or its reverse). Last invocation's result wins.
    pub(crate) fn dispatch_broadcast<R>(
        &self,
        reverse: bool,
        op: &mut dyn FnMut(&H) -> R,
    ) -> Option<R> {
        if !self.addresses().read().has_nodes() {
            return None;
        }
        let _guard = self.lock().lock();
        // Pin every node up front so mid-broadcast container changes cannot
        // invalidate the walk, forward or reverse.
        let nodes = self.addresses().read().nodes(reverse);
        let mut last = None;
        for node in &nodes {
            if let Some(result) = run_node(node, reverse, op) {
                last = Some(result);
            }
        }
        last
    }

    /// Read-only walk over connected handlers, at one address or all of
    /// them. `cb` returning `false` aborts the enumeration early.
    ///
    /// Handlers seen here may already be disconnected by the time the caller
    /// acts on them; this walk is only meaningful for existence-style checks.
    pub(crate) fn enumerate(&self, at: Option<&I>, cb: &mut dyn FnMut(&I, &Arc<H>) -> bool) {
        let _guard = self.lock().lock();
        let nodes = match at {
            Some(id) => match self.addresses().read().find(id) {
                Some(node) => vec![node],
                None => return,
            },
            None => self.addresses().read().nodes(false),
        };
        for node in &nodes {
            if !walk_node(node, cb) {
                return;
            }
        }
    }

    /// [`enumerate`](Self::enumerate) over one already-resolved node (cached
    /// address pointer path).
    pub(crate) fn enumerate_node(
        &self,
        node: &AddressNode<H, I>,
        cb: &mut dyn FnMut(&I, &Arc<H>) -> bool,
    ) {
        let _guard = self.lock().lock();
        walk_node(node, cb);
    }

    /// First connected handler at `id`, or anywhere when `at` is `None`.
    pub(crate) fn find_first(&self, at: Option<&I>) -> Option<Arc<H>> {
        let _guard = self.lock().lock();
        match at {
            Some(id) => self.addresses().read().find(id)?.list().lock().first(),
            None => self
                .addresses()
                .read()
                .nodes(false)
                .iter()
                .find_map(|node| node.list().lock().first()),
        }
    }

    /// Number of handlers connected at `id` (0 for an unknown id).
    pub(crate) fn count_at(&self, id: &I) -> usize {
        let _guard = self.lock().lock();
        self.addresses()
            .read()
            .find(id)
            .map_or(0, |node| node.list().lock().len())
    }

    /// Number of handlers connected across all addresses.
    pub(crate) fn count_total(&self) -> usize {
        let _guard = self.lock().lock();
        self.addresses()
            .read()
            .nodes(false)
            .iter()
            .map(|node| node.list().lock().len())
            .sum()
    }
}

/// Read-only walk over one node's connected handlers; returns `false` when
/// the callback aborted the enumeration.
fn walk_node<H: ?Sized, I>(
    node: &AddressNode<H, I>,
    cb: &mut dyn FnMut(&I, &Arc<H>) -> bool,
) -> bool {
    let snapshot = node.list().lock().snapshot();
    for (slot, handler) in &snapshot {
        let connected = node.list().lock().contains(*slot);
        if connected && !cb(node.id(), handler) {
            return false;
        }
    }
    true
}

/// Walks one node's snapshot, advancing past each entry before invoking it
/// and skipping entries disconnected since the snapshot was taken.
pub(crate) fn run_node<H: ?Sized, I, R>(
    node: &AddressNode<H, I>,
    reverse: bool,
    op: &mut dyn FnMut(&H) -> R,
) -> Option<R> {
    let snapshot = node.list().lock().snapshot();
    if snapshot.is_empty() {
        return None;
    }
    let mut last = None;
    let mut visit = |slot: u64, handler: &Arc<H>| {
        if node.list().lock().contains(slot) {
            last = Some(op(handler));
        }
    };
    if reverse {
        for (slot, handler) in snapshot.iter().rev() {
            visit(*slot, handler);
        }
    } else {
        for (slot, handler) in snapshot.iter() {
            visit(*slot, handler);
        }
    }
    last
}
