//! # The bus: public dispatch surface.
//!
//! A [`Bus`] is a named, typed channel through which callers invoke
//! operations on zero or more connected handlers without knowing who they
//! are. Buses come in three address modes:
//!
//! - [`Bus::single`] one implicit address; broadcast is the only idiom.
//! - [`Bus::keyed`] hash-keyed addresses; events target one id, broadcasts
//!   visit every id in unspecified order.
//! - [`Bus::ordered`] tree-keyed addresses; broadcasts visit ids in
//!   ascending `Ord` order (newtype the id to customize it).
//!
//! Every dispatch call is synchronous and blocking: it runs all matching
//! handlers on the calling thread before returning. The `queue_*` variants
//! instead capture the call and return immediately; whichever thread later
//! calls [`Bus::execute_queued_events`] runs the backlog through the same
//! dispatch paths.
//!
//! ```text
//! caller ── event(id, op) ──► router chain ──► dispatch lock
//!                                 │                 │
//!                              (claim?)         address node
//!                                 │                 │
//!                               done          op(handler) x N, in order
//! ```
//!
//! ## Example
//! ```
//! use std::sync::Arc;
//! use relaybus::{Bus, BusConfig};
//!
//! trait Notifications: Send + Sync {
//!     fn on_saved(&self, name: &str);
//! }
//!
//! struct Printer;
//! impl Notifications for Printer {
//!     fn on_saved(&self, name: &str) {
//!         println!("saved {name}");
//!     }
//! }
//!
//! let bus: Bus<dyn Notifications> = Bus::single(BusConfig::default());
//! let conn = bus.connect(Arc::new(Printer));
//! bus.broadcast(|h| h.on_saved("scene.layout"));
//! conn.disconnect();
//! ```
//!
//! ## Handler lifetime
//! The bus holds shared (`Arc`) references to handlers; a handler stays
//! alive at least until every in-flight dispatch that reached it has
//! finished. Connecting returns a [`Connection`] that disconnects on
//! [`Connection::disconnect`] or on drop — hold on to it.

use std::hash::Hash;
use std::sync::{Arc, Weak};

use crate::address::{AddressContainer, AddressNode, NodePin};
use crate::config::BusConfig;
use crate::core::BusContext;
use crate::error::QueueError;
use crate::router::Router;

/// Marker for types usable as a bus address key.
///
/// Blanket-implemented; `Ord` is only exercised by [`Bus::ordered`] buses,
/// where it defines broadcast iteration order.
pub trait BusId: Clone + Eq + Hash + Ord + Send + Sync + 'static {}

impl<T: Clone + Eq + Hash + Ord + Send + Sync + 'static> BusId for T {}

/// A typed dispatch channel. Cloning is cheap and clones share all state.
///
/// `H` is the handler interface (typically a `dyn Trait`); `I` is the
/// address key type, `()` for single-address buses.
pub struct Bus<H: ?Sized + Send + Sync + 'static, I: BusId = ()> {
    ctx: Arc<BusContext<H, I>>,
}

impl<H: ?Sized + Send + Sync + 'static, I: BusId> Clone for Bus<H, I> {
    fn clone(&self) -> Self {
        Self {
            ctx: Arc::clone(&self.ctx),
        }
    }
}

/// A connected handler's registration. Disconnects on drop.
#[must_use = "dropping a Connection disconnects the handler"]
pub struct Connection<H: ?Sized + Send + Sync + 'static, I: BusId = ()> {
    ctx: Weak<BusContext<H, I>>,
    node: Weak<AddressNode<H, I>>,
    slot: u64,
}

/// A pre-resolved handle to one address's handler list.
///
/// Dispatching through it skips the id lookup; order and results are
/// identical to [`Bus::event`], and stay identical across the address's
/// whole lifetime: the pointer pins its node in the container, so even after
/// every handler at the id disconnects, a later reconnect at the same id
/// reaches the pointer again. While nobody is connected, dispatching through
/// it is a silent no-op.
pub struct AddressPtr<H: ?Sized + Send + Sync + 'static, I: BusId> {
    ctx: Arc<BusContext<H, I>>,
    pin: NodePin<H, I>,
}

impl<H: ?Sized + Send + Sync + 'static, I: BusId> Clone for AddressPtr<H, I> {
    fn clone(&self) -> Self {
        Self {
            ctx: Arc::clone(&self.ctx),
            pin: self.pin.clone(),
        }
    }
}

impl<H: ?Sized + Send + Sync + 'static> Bus<H, ()> {
    /// Builds a single-address (broadcast-only) bus.
    pub fn single(config: BusConfig) -> Self {
        Self {
            ctx: Arc::new(BusContext::new(config, AddressContainer::single(()))),
        }
    }

    /// Connects a handler to the single implicit address.
    pub fn connect(&self, handler: Arc<H>) -> Connection<H, ()> {
        self.connect_at((), handler)
    }
}

impl<H: ?Sized + Send + Sync + 'static, I: BusId> Bus<H, I> {
    /// Builds a multi-address bus with hash-keyed addresses.
    pub fn keyed(config: BusConfig) -> Self {
        Self {
            ctx: Arc::new(BusContext::new(config, AddressContainer::by_id())),
        }
    }

    /// Builds a multi-address bus whose broadcasts visit addresses in
    /// ascending `Ord` order of the id type.
    pub fn ordered(config: BusConfig) -> Self {
        Self {
            ctx: Arc::new(BusContext::new(config, AddressContainer::ordered())),
        }
    }

    /// This bus's construction-time configuration.
    pub fn config(&self) -> BusConfig {
        *self.ctx.config()
    }

    // ---- Connection management ----

    /// Connects a handler at `id`, creating the address on first use.
    ///
    /// Connecting the same handler twice is not detected; it will be invoked
    /// once per connection.
    pub fn connect_at(&self, id: I, handler: Arc<H>) -> Connection<H, I> {
        let (node, slot) = self.ctx.connect_at(&id, handler);
        Connection {
            ctx: Arc::downgrade(&self.ctx),
            node: Arc::downgrade(&node),
            slot,
        }
    }

    /// Resolves `id` once for repeated dispatch, creating the address on
    /// first use. The returned pointer keeps the address registered for as
    /// long as it (or any clone) lives.
    pub fn bind(&self, id: I) -> AddressPtr<H, I> {
        let node = {
            let _guard = self.ctx.lock().lock();
            self.ctx.addresses().write().get_or_create(&id)
        };
        AddressPtr {
            ctx: Arc::clone(&self.ctx),
            pin: NodePin::new(node),
        }
    }

    // ---- Synchronous dispatch ----

    /// Invokes `op` on every handler at `id`, in connection order.
    /// No handlers (or an unknown id) is a silent no-op.
    pub fn event(&self, id: &I, mut op: impl FnMut(&H)) {
        if self.ctx.routers().claims(Some(id), false, false) {
            return;
        }
        self.ctx.dispatch_event(id, false, &mut |h| op(h));
    }

    /// Like [`event`](Self::event), collecting results: the last handler
    /// invoked wins. Returns `None` when no handler was invoked.
    pub fn event_result<R>(&self, id: &I, mut op: impl FnMut(&H) -> R) -> Option<R> {
        if self.ctx.routers().claims(Some(id), false, false) {
            return None;
        }
        self.ctx.dispatch_event(id, false, &mut op)
    }

    /// Invokes `op` on every handler at `id`, in reverse connection order.
    pub fn event_reverse(&self, id: &I, mut op: impl FnMut(&H)) {
        if self.ctx.routers().claims(Some(id), false, true) {
            return;
        }
        self.ctx.dispatch_event(id, true, &mut |h| op(h));
    }

    /// Reverse-ordered [`event_result`](Self::event_result).
    pub fn event_result_reverse<R>(&self, id: &I, mut op: impl FnMut(&H) -> R) -> Option<R> {
        if self.ctx.routers().claims(Some(id), false, true) {
            return None;
        }
        self.ctx.dispatch_event(id, true, &mut op)
    }

    /// Invokes `op` on every handler at every address, addresses in
    /// container order and handlers in connection order.
    pub fn broadcast(&self, mut op: impl FnMut(&H)) {
        if self.ctx.routers().claims(None, false, false) {
            return;
        }
        self.ctx.dispatch_broadcast(false, &mut |h| op(h));
    }

    /// Result-collecting broadcast; the last handler invoked wins.
    pub fn broadcast_result<R>(&self, mut op: impl FnMut(&H) -> R) -> Option<R> {
        if self.ctx.routers().claims(None, false, false) {
            return None;
        }
        self.ctx.dispatch_broadcast(false, &mut op)
    }

    /// Broadcast in reverse container order, handlers in reverse connection
    /// order.
    pub fn broadcast_reverse(&self, mut op: impl FnMut(&H)) {
        if self.ctx.routers().claims(None, false, true) {
            return;
        }
        self.ctx.dispatch_broadcast(true, &mut |h| op(h));
    }

    /// Reverse-ordered [`broadcast_result`](Self::broadcast_result).
    pub fn broadcast_result_reverse<R>(&self, mut op: impl FnMut(&H) -> R) -> Option<R> {
        if self.ctx.routers().claims(None, false, true) {
            return None;
        }
        self.ctx.dispatch_broadcast(true, &mut op)
    }

    // ---- Deferred dispatch ----

    /// Defers an [`event`](Self::event) call. Nothing is invoked until
    /// [`execute_queued_events`](Self::execute_queued_events) runs on some
    /// thread.
    ///
    /// The closure must own its captures (`Send + 'static`); borrowed
    /// arguments are rejected at compile time.
    pub fn queue_event(
        &self,
        id: I,
        mut op: impl FnMut(&H) + Send + 'static,
    ) -> Result<(), QueueError> {
        let queue = self.ctx.accepting_queue()?;
        if self.ctx.routers().claims(Some(&id), true, false) {
            return Ok(());
        }
        let ctx = Arc::downgrade(&self.ctx);
        queue.push(Box::new(move || {
            if let Some(ctx) = ctx.upgrade() {
                ctx.dispatch_event(&id, false, &mut |h| op(h));
            }
        }));
        Ok(())
    }

    /// Defers a [`broadcast`](Self::broadcast) call.
    pub fn queue_broadcast(&self, mut op: impl FnMut(&H) + Send + 'static) -> Result<(), QueueError> {
        let queue = self.ctx.accepting_queue()?;
        if self.ctx.routers().claims(None, true, false) {
            return Ok(());
        }
        let ctx = Arc::downgrade(&self.ctx);
        queue.push(Box::new(move || {
            if let Some(ctx) = ctx.upgrade() {
                ctx.dispatch_broadcast(false, &mut |h| op(h));
            }
        }));
        Ok(())
    }

    /// Reverse-ordered [`queue_event`](Self::queue_event): the drain invokes
    /// handlers in reverse connection order as of drain time.
    pub fn queue_event_reverse(
        &self,
        id: I,
        mut op: impl FnMut(&H) + Send + 'static,
    ) -> Result<(), QueueError> {
        let queue = self.ctx.accepting_queue()?;
        if self.ctx.routers().claims(Some(&id), true, true) {
            return Ok(());
        }
        let ctx = Arc::downgrade(&self.ctx);
        queue.push(Box::new(move || {
            if let Some(ctx) = ctx.upgrade() {
                ctx.dispatch_event(&id, true, &mut |h| op(h));
            }
        }));
        Ok(())
    }

    /// Reverse-ordered [`queue_broadcast`](Self::queue_broadcast).
    pub fn queue_broadcast_reverse(
        &self,
        mut op: impl FnMut(&H) + Send + 'static,
    ) -> Result<(), QueueError> {
        let queue = self.ctx.accepting_queue()?;
        if self.ctx.routers().claims(None, true, true) {
            return Ok(());
        }
        let ctx = Arc::downgrade(&self.ctx);
        queue.push(Box::new(move || {
            if let Some(ctx) = ctx.upgrade() {
                ctx.dispatch_broadcast(true, &mut |h| op(h));
            }
        }));
        Ok(())
    }

    /// Defers an arbitrary callable, FIFO-ordered with queued events.
    /// Routers do not see queued functions; they are not events.
    pub fn queue_function(&self, f: impl FnOnce() + Send + 'static) -> Result<(), QueueError> {
        let queue = self.ctx.accepting_queue()?;
        queue.push(Box::new(f));
        Ok(())
    }

    /// Drains exactly one generation of queued work in FIFO order on the
    /// calling thread, re-entering the normal dispatch paths. Returns the
    /// number of entries executed. No-op on a queueing-disabled bus.
    pub fn execute_queued_events(&self) -> usize {
        match self.ctx.queue() {
            Some(queue) => {
                let executed = queue.execute();
                if executed > 0 {
                    tracing::debug!(executed, "drained queued events");
                }
                executed
            }
            None => 0,
        }
    }

    /// Discards all queued work without invoking it. Returns the number of
    /// entries discarded. Used on shutdown paths where running handlers
    /// would be meaningless.
    pub fn clear_queued_events(&self) -> usize {
        match self.ctx.queue() {
            Some(queue) => {
                let discarded = queue.clear();
                if discarded > 0 {
                    tracing::debug!(discarded, "discarded queued events");
                }
                discarded
            }
            None => 0,
        }
    }

    /// Switches acceptance of new queued work on or off. Already-queued
    /// entries still execute. No-op on a queueing-disabled bus.
    pub fn allow_function_queuing(&self, allow: bool) {
        if let Some(queue) = self.ctx.queue() {
            queue.set_active(allow);
        }
    }

    /// Whether the bus currently accepts queued work.
    pub fn is_function_queuing(&self) -> bool {
        self.ctx.queue().is_some_and(|q| q.is_active())
    }

    // ---- Introspection ----

    /// Walks connected handlers at every address; `cb` returning `false`
    /// aborts early.
    ///
    /// A handler seen here may disconnect before the caller acts on it; use
    /// this for existence-style checks, not for holding onto handlers.
    pub fn enumerate_handlers(&self, mut cb: impl FnMut(&I, &Arc<H>) -> bool) {
        self.ctx.enumerate(None, &mut cb);
    }

    /// Walks connected handlers at one address; `cb` returning `false`
    /// aborts early.
    pub fn enumerate_handlers_at(&self, id: &I, mut cb: impl FnMut(&I, &Arc<H>) -> bool) {
        self.ctx.enumerate(Some(id), &mut cb);
    }

    /// First connected handler anywhere, in container-then-connection order.
    pub fn find_first_handler(&self) -> Option<Arc<H>> {
        self.ctx.find_first(None)
    }

    /// First connected handler at `id`.
    pub fn find_first_handler_at(&self, id: &I) -> Option<Arc<H>> {
        self.ctx.find_first(Some(id))
    }

    /// Number of handlers currently connected at `id` (0 for unknown ids).
    pub fn handler_count(&self, id: &I) -> usize {
        self.ctx.count_at(id)
    }

    /// Number of handlers currently connected across all addresses.
    pub fn total_handler_count(&self) -> usize {
        self.ctx.count_total()
    }

    /// Whether any handler is connected anywhere.
    pub fn has_handlers(&self) -> bool {
        self.find_first_handler().is_some()
    }

    /// Whether any handler is connected at `id`.
    pub fn has_handlers_at(&self, id: &I) -> bool {
        self.handler_count(id) > 0
    }

    // ---- Routers ----

    /// Appends a router to the interception chain.
    pub fn add_router(&self, router: Arc<dyn Router<I>>) {
        self.ctx.routers().add(router);
    }

    /// Removes a previously added router (matched by identity).
    pub fn remove_router(&self, router: &Arc<dyn Router<I>>) {
        self.ctx.routers().remove(router);
    }
}

impl<H: ?Sized + Send + Sync + 'static, I: BusId> Connection<H, I> {
    /// Disconnects the handler. Equivalent to dropping the connection;
    /// provided for call sites where the intent should be explicit.
    pub fn disconnect(self) {
        drop(self);
    }

    /// Whether the handler is still connected (false once the bus itself is
    /// gone).
    pub fn is_connected(&self) -> bool {
        self.node
            .upgrade()
            .is_some_and(|node| node.list().lock().contains(self.slot))
    }
}

impl<H: ?Sized + Send + Sync + 'static, I: BusId> Drop for Connection<H, I> {
    fn drop(&mut self) {
        if let (Some(ctx), Some(node)) = (self.ctx.upgrade(), self.node.upgrade()) {
            ctx.disconnect(&node, self.slot);
        }
    }
}

impl<H: ?Sized + Send + Sync + 'static, I: BusId> AddressPtr<H, I> {
    /// The address this pointer was bound to.
    pub fn id(&self) -> &I {
        self.pin.node().id()
    }

    /// [`Bus::event`] without the id lookup.
    pub fn event(&self, mut op: impl FnMut(&H)) {
        if self.ctx.routers().claims(Some(self.id()), false, false) {
            return;
        }
        self.ctx.dispatch_node(self.pin.node(), false, &mut |h| op(h));
    }

    /// [`Bus::event_result`] without the id lookup.
    pub fn event_result<R>(&self, mut op: impl FnMut(&H) -> R) -> Option<R> {
        if self.ctx.routers().claims(Some(self.id()), false, false) {
            return None;
        }
        self.ctx.dispatch_node(self.pin.node(), false, &mut op)
    }

    /// [`Bus::event_reverse`] without the id lookup.
    pub fn event_reverse(&self, mut op: impl FnMut(&H)) {
        if self.ctx.routers().claims(Some(self.id()), false, true) {
            return;
        }
        self.ctx.dispatch_node(self.pin.node(), true, &mut |h| op(h));
    }

    /// [`Bus::event_result_reverse`] without the id lookup.
    pub fn event_result_reverse<R>(&self, mut op: impl FnMut(&H) -> R) -> Option<R> {
        if self.ctx.routers().claims(Some(self.id()), false, true) {
            return None;
        }
        self.ctx.dispatch_node(self.pin.node(), true, &mut op)
    }

    /// [`Bus::queue_event`] without the id lookup. The queued entry keeps
    /// this pointer's address pinned until executed or cleared.
    pub fn queue_event(&self, mut op: impl FnMut(&H) + Send + 'static) -> Result<(), QueueError> {
        let queue = self.ctx.accepting_queue()?;
        if self.ctx.routers().claims(Some(self.id()), true, false) {
            return Ok(());
        }
        let ctx = Arc::downgrade(&self.ctx);
        let pin = self.pin.clone();
        queue.push(Box::new(move || {
            if let Some(ctx) = ctx.upgrade() {
                ctx.dispatch_node(pin.node(), false, &mut |h| op(h));
            }
        }));
        Ok(())
    }

    /// [`Bus::enumerate_handlers_at`] without the id lookup.
    pub fn enumerate_handlers(&self, mut cb: impl FnMut(&I, &Arc<H>) -> bool) {
        self.ctx.enumerate_node(self.pin.node(), &mut cb);
    }

    /// First connected handler at this address.
    pub fn find_first_handler(&self) -> Option<Arc<H>> {
        let _guard = self.ctx.lock().lock();
        self.pin.node().list().lock().first()
    }

    /// Number of handlers currently connected at this address.
    pub fn handler_count(&self) -> usize {
        let _guard = self.ctx.lock().lock();
        self.pin.node().list().lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    trait Probe: Send + Sync {
        fn poke(&self) -> i32;
    }

    struct Counter(AtomicUsize);

    impl Probe for Counter {
        fn poke(&self) -> i32 {
            self.0.fetch_add(1, Ordering::SeqCst) as i32
        }
    }

    #[test]
    fn test_connect_dispatch_disconnect_round_trip() {
        let bus: Bus<dyn Probe> = Bus::single(BusConfig::default());
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let conn = bus.connect(counter.clone());

        bus.broadcast(|h| {
            h.poke();
        });
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        assert!(conn.is_connected());

        conn.disconnect();
        bus.broadcast(|h| {
            h.poke();
        });
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dropping_the_connection_disconnects() {
        let bus: Bus<dyn Probe> = Bus::single(BusConfig::default());
        {
            let _conn = bus.connect(Arc::new(Counter(AtomicUsize::new(0))));
            assert_eq!(bus.total_handler_count(), 1);
        }
        assert_eq!(bus.total_handler_count(), 0);
        assert!(!bus.has_handlers());
    }

    #[test]
    fn test_queue_errors_reflect_configuration() {
        let disabled: Bus<dyn Probe> = Bus::single(BusConfig::default().with_queueing(false));
        assert_eq!(
            disabled.queue_function(|| {}),
            Err(QueueError::Disabled)
        );
        assert_eq!(disabled.execute_queued_events(), 0);
        assert!(!disabled.is_function_queuing());

        let dormant: Bus<dyn Probe> =
            Bus::single(BusConfig::default().with_queueing_active(false));
        assert_eq!(dormant.queue_function(|| {}), Err(QueueError::Inactive));
        dormant.allow_function_queuing(true);
        assert!(dormant.is_function_queuing());
        assert_eq!(dormant.queue_function(|| {}), Ok(()));
        assert_eq!(dormant.execute_queued_events(), 1);
    }

    #[test]
    fn test_clones_share_state() {
        let bus: Bus<dyn Probe, u32> = Bus::keyed(BusConfig::default());
        let other = bus.clone();
        let _conn = bus.connect_at(9, Arc::new(Counter(AtomicUsize::new(0))));
        assert_eq!(other.handler_count(&9), 1);
        assert!(other.has_handlers_at(&9));
    }
}
