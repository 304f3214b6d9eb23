//! # Address container: routing a bus id to its handler list.
//!
//! [`AddressContainer`] comes in three shapes, fixed when the bus is built:
//!
//! - `Single` exactly one implicit address; the node exists for the lifetime
//!   of the bus.
//! - `ById` hash-keyed addresses; broadcast visits them in unspecified order.
//! - `Ordered` tree-keyed addresses; broadcast visits them in ascending key
//!   order (callers pick the order by how their id type implements `Ord`).
//!
//! Nodes are shared (`Arc`): a broadcast clones every node it is about to
//! walk, and a cached address pointer holds a [`NodePin`] on its node. An
//! empty keyed node is pruned from the container when its last handler
//! disconnects, unless it is pinned: a pinned node stays registered, so a
//! later reconnect at the same id reuses it and dispatch through the pointer
//! stays identical to dispatch by id. Once the last pin drops, an empty node
//! remains as a placeholder until a later disconnect at its id prunes it.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::HandlerList;

/// One address: its id plus its handler list.
///
/// The list's own lock is held only for structural operations and snapshots,
/// never across a handler invocation.
pub(crate) struct AddressNode<H: ?Sized, I> {
    id: I,
    list: Mutex<HandlerList<H>>,
    pins: AtomicUsize,
}

impl<H: ?Sized, I> AddressNode<H, I> {
    fn new(id: I) -> Self {
        Self {
            id,
            list: Mutex::new(HandlerList::new()),
            pins: AtomicUsize::new(0),
        }
    }

    pub(crate) fn id(&self) -> &I {
        &self.id
    }

    pub(crate) fn list(&self) -> &Mutex<HandlerList<H>> {
        &self.list
    }

    fn is_pinned(&self) -> bool {
        self.pins.load(Ordering::Acquire) > 0
    }
}

/// Keeps an address node registered in its container while held.
///
/// Cached address pointers and pending queued entries hold one; as long as
/// any pin exists, [`AddressContainer::prune`] leaves the node in place and
/// reconnects at its id reuse it.
pub(crate) struct NodePin<H: ?Sized, I> {
    node: Arc<AddressNode<H, I>>,
}

impl<H: ?Sized, I> NodePin<H, I> {
    pub(crate) fn new(node: Arc<AddressNode<H, I>>) -> Self {
        node.pins.fetch_add(1, Ordering::AcqRel);
        Self { node }
    }

    pub(crate) fn node(&self) -> &Arc<AddressNode<H, I>> {
        &self.node
    }
}

impl<H: ?Sized, I> Clone for NodePin<H, I> {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.node))
    }
}

impl<H: ?Sized, I> Drop for NodePin<H, I> {
    fn drop(&mut self) {
        self.node.pins.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Maps a bus id (or the single implicit address) to its node.
pub(crate) enum AddressContainer<H: ?Sized, I> {
    Single(Arc<AddressNode<H, I>>),
    ById(HashMap<I, Arc<AddressNode<H, I>>>),
    Ordered(BTreeMap<I, Arc<AddressNode<H, I>>>),
}

impl<H, I> AddressContainer<H, I>
where
    H: ?Sized,
    I: Clone + Eq + std::hash::Hash + Ord,
{
    pub(crate) fn single(id: I) -> Self {
        AddressContainer::Single(Arc::new(AddressNode::new(id)))
    }

    pub(crate) fn by_id() -> Self {
        AddressContainer::ById(HashMap::new())
    }

    pub(crate) fn ordered() -> Self {
        AddressContainer::Ordered(BTreeMap::new())
    }

    /// Looks up the node for `id`, if one exists.
    pub(crate) fn find(&self, id: &I) -> Option<Arc<AddressNode<H, I>>> {
        match self {
            AddressContainer::Single(node) => Some(Arc::clone(node)),
            AddressContainer::ById(map) => map.get(id).cloned(),
            AddressContainer::Ordered(map) => map.get(id).cloned(),
        }
    }

    /// Returns the node for `id`, creating an empty one on first use.
    pub(crate) fn get_or_create(&mut self, id: &I) -> Arc<AddressNode<H, I>> {
        match self {
            AddressContainer::Single(node) => Arc::clone(node),
            AddressContainer::ById(map) => Arc::clone(
                map.entry(id.clone())
                    .or_insert_with(|| Arc::new(AddressNode::new(id.clone()))),
            ),
            AddressContainer::Ordered(map) => Arc::clone(
                map.entry(id.clone())
                    .or_insert_with(|| Arc::new(AddressNode::new(id.clone()))),
            ),
        }
    }

    /// Drops `node` from the container if it is still the one registered for
    /// its id, has no handlers left, and is not pinned. The single implicit
    /// node is never pruned.
    pub(crate) fn prune(&mut self, node: &Arc<AddressNode<H, I>>) {
        if !node.list().lock().is_empty() || node.is_pinned() {
            return;
        }
        match self {
            AddressContainer::Single(_) => {}
            AddressContainer::ById(map) => {
                if map.get(node.id()).is_some_and(|n| Arc::ptr_eq(n, node)) {
                    map.remove(node.id());
                }
            }
            AddressContainer::Ordered(map) => {
                if map.get(node.id()).is_some_and(|n| Arc::ptr_eq(n, node)) {
                    map.remove(node.id());
                }
            }
        }
    }

    /// Pins every node in container order (ascending key order for
    /// `Ordered`, unspecified for `ById`), reversed when `reverse` is set.
    pub(crate) fn nodes(&self, reverse: bool) -> Vec<Arc<AddressNode<H, I>>> {
        let mut nodes = match self {
            AddressContainer::Single(node) => vec![Arc::clone(node)],
            AddressContainer::ById(map) => map.values().cloned().collect(),
            AddressContainer::Ordered(map) => map.values().cloned().collect(),
        };
        if reverse {
            nodes.reverse();
        }
        nodes
    }

    /// Fast emptiness check used to short-circuit broadcasts. `Single` is
    /// conservatively reported as non-empty; its node decides at walk time.
    pub(crate) fn has_nodes(&self) -> bool {
        match self {
            AddressContainer::Single(_) => true,
            AddressContainer::ById(map) => !map.is_empty(),
            AddressContainer::Ordered(map) => !map.is_empty(),
        }
    }
}
