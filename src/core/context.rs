//! # Per-bus shared state.
//!
//! One [`BusContext`] exists per bus for the lifetime of use; every clone of
//! a [`Bus`](crate::Bus) and every outstanding [`AddressPtr`](crate::AddressPtr)
//! shares it. It holds the address container, the event queue, the router
//! chain, and the dispatch lock selected by the bus's locking policy. It is
//! torn down when the last shared reference drops; a freshly built bus
//! behaves identically to one that was torn down and rebuilt.
//!
//! ## Lock ordering
//! The dispatch lock is always acquired first; the container and list locks
//! are taken underneath it and held only for structural work, never across a
//! handler invocation. The queue's push-lock is independent of all of them.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::address::{AddressContainer, AddressNode};
use crate::bus::BusId;
use crate::config::BusConfig;
use crate::error::QueueError;
use crate::policies::DispatchLock;
use crate::queue::EventQueue;
use crate::router::RouterChain;

/// Shared state behind one bus: addresses, queue, routers, dispatch lock.
pub(crate) struct BusContext<H: ?Sized, I> {
    config: BusConfig,
    lock: DispatchLock,
    addresses: RwLock<AddressContainer<H, I>>,
    routers: RouterChain<I>,
    queue: Option<EventQueue>,
}

impl<H: ?Sized, I: BusId> BusContext<H, I> {
    pub(crate) fn new(config: BusConfig, addresses: AddressContainer<H, I>) -> Self {
        Self {
            lock: DispatchLock::new(config.lock),
            addresses: RwLock::new(addresses),
            routers: RouterChain::new(),
            queue: config.queueing.then(|| EventQueue::new(config.queueing_active)),
            config,
        }
    }

    pub(crate) fn config(&self) -> &BusConfig {
        &self.config
    }

    pub(crate) fn lock(&self) -> &DispatchLock {
        &self.lock
    }

    pub(crate) fn addresses(&self) -> &RwLock<AddressContainer<H, I>> {
        &self.addresses
    }

    pub(crate) fn routers(&self) -> &RouterChain<I> {
        &self.routers
    }

    pub(crate) fn queue(&self) -> Option<&EventQueue> {
        self.queue.as_ref()
    }

    /// The queue, provided it exists and currently accepts work.
    pub(crate) fn accepting_queue(&self) -> Result<&EventQueue, QueueError> {
        let queue = self.queue.as_ref().ok_or(QueueError::Disabled)?;
        if !queue.is_active() {
            return Err(QueueError::Inactive);
        }
        Ok(queue)
    }

    /// Connects a handler at `id`, creating the address node on first use.
    /// Returns the node and the handler's slot within it.
    pub(crate) fn connect_at(&self, id: &I, handler: Arc<H>) -> (Arc<AddressNode<H, I>>, u64) {
        let _guard = self.lock.lock();
        let node = self.addresses.write().get_or_create(id);
        let slot = node.list().lock().insert(handler);
        tracing::trace!(slot, "handler connected");
        (node, slot)
    }

    /// Disconnects the handler at `slot` on `node`. Empty keyed nodes are
    /// pruned from the container; an in-flight dispatch that pinned the node
    /// simply finds it empty. Returns `false` if the slot was already gone.
    pub(crate) fn disconnect(&self, node: &Arc<AddressNode<H, I>>, slot: u64) -> bool {
        let _guard = self.lock.lock();
        let removed = node.list().lock().remove(slot);
        if removed {
            tracing::trace!(slot, "handler disconnected");
            self.addresses.write().prune(node);
        }
        removed
    }
}
