//! # Router chain: intercepting calls before dispatch.
//!
//! A [`Router`] inspects an outgoing call before normal handler dispatch and
//! may claim it, in which case handlers are never invoked (and, for queued
//! calls, nothing is enqueued).
//!
//! Routers see the call's shape, not its payload: the target id (`None` for
//! broadcasts) and whether the call is queued and/or reverse-ordered.
//!
//! The chain is evaluated in registration order and stops at the first
//! [`RouterDisposition::Claim`]. A bus with no routers pays only an emptiness
//! check per dispatch.

use std::sync::Arc;

use parking_lot::RwLock;

/// What a router decided about one call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouterDisposition {
    /// Let the call continue to the next router and then to handlers.
    Pass,
    /// Swallow the call: no further routers, no handlers, no enqueuing.
    Claim,
}

/// An interceptor that may claim a call before normal dispatch.
pub trait Router<I>: Send + Sync {
    /// Inspects one outgoing call.
    ///
    /// # Parameters
    /// - `id`: target address, `None` for broadcasts
    /// - `queued`: `true` when the call is being enqueued rather than
    ///   dispatched immediately
    /// - `reverse`: `true` for reverse-ordered dispatch
    fn route(&self, id: Option<&I>, queued: bool, reverse: bool) -> RouterDisposition;
}

/// Registration-ordered chain of routers.
pub(crate) struct RouterChain<I> {
    routers: RwLock<Vec<Arc<dyn Router<I>>>>,
}

impl<I> RouterChain<I> {
    pub(crate) fn new() -> Self {
        Self {
            routers: RwLock::new(Vec::new()),
        }
    }

    pub(crate) fn add(&self, router: Arc<dyn Router<I>>) {
        self.routers.write().push(router);
    }

    /// Removes a previously added router (matched by identity).
    pub(crate) fn remove(&self, router: &Arc<dyn Router<I>>) {
        self.routers
            .write()
            .retain(|r| !Arc::ptr_eq(r, router));
    }

    /// Runs the chain. Returns `true` when some router claimed the call.
    pub(crate) fn claims(&self, id: Option<&I>, queued: bool, reverse: bool) -> bool {
        let routers = self.routers.read();
        if routers.is_empty() {
            return false;
        }
        for router in routers.iter() {
            if router.route(id, queued, reverse) == RouterDisposition::Claim {
                tracing::debug!(queued, reverse, "router claimed call");
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Recorder {
        order: Arc<Mutex<Vec<&'static str>>>,
        tag: &'static str,
        disposition: RouterDisposition,
    }

    impl Router<u32> for Recorder {
        fn route(&self, _id: Option<&u32>, _queued: bool, _reverse: bool) -> RouterDisposition {
            self.order.lock().push(self.tag);
            self.disposition
        }
    }

    #[test]
    fn test_chain_runs_in_registration_order() {
        let chain: RouterChain<u32> = RouterChain::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for tag in ["a", "b"] {
            chain.add(Arc::new(Recorder {
                order: Arc::clone(&order),
                tag,
                disposition: RouterDisposition::Pass,
            }));
        }
        assert!(!chain.claims(Some(&1), false, false));
        assert_eq!(*order.lock(), vec!["a", "b"]);
    }

    #[test]
    fn test_claim_stops_the_chain() {
        let chain: RouterChain<u32> = RouterChain::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        chain.add(Arc::new(Recorder {
            order: Arc::clone(&order),
            tag: "claimer",
            disposition: RouterDisposition::Claim,
        }));
        chain.add(Arc::new(Recorder {
            order: Arc::clone(&order),
            tag: "never",
            disposition: RouterDisposition::Pass,
        }));
        assert!(chain.claims(None, false, false));
        assert_eq!(*order.lock(), vec!["claimer"]);
    }

    #[test]
    fn test_removed_router_no_longer_runs() {
        struct Counter(AtomicUsize);
        impl Router<u32> for Counter {
            fn route(&self, _: Option<&u32>, _: bool, _: bool) -> RouterDisposition {
                self.0.fetch_add(1, Ordering::SeqCst);
                RouterDisposition::Pass
            }
        }

        let chain: RouterChain<u32> = RouterChain::new();
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let as_router: Arc<dyn Router<u32>> = counter.clone();
        chain.add(Arc::clone(&as_router));
        chain.claims(None, false, false);
        chain.remove(&as_router);
        chain.claims(None, false, false);
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }
}
