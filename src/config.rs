//! # Per-bus configuration.
//!
//! [`BusConfig`] fixes a bus's behavior at construction time: which dispatch
//! lock it uses, whether deferred (queued) delivery is available, and whether
//! the queue starts out accepting work.
//!
//! The address mode (single / keyed / keyed-and-ordered) is not part of the
//! config; it is chosen by the constructor ([`Bus::single`], [`Bus::keyed`],
//! [`Bus::ordered`]).
//!
//! # Example
//! ```
//! use relaybus::{BusConfig, LockPolicy};
//!
//! let cfg = BusConfig::default()
//!     .with_lock(LockPolicy::Reentrant)
//!     .with_queueing(true);
//!
//! assert_eq!(cfg.lock, LockPolicy::Reentrant);
//! assert!(cfg.queueing_active);
//! ```
//!
//! [`Bus::single`]: crate::Bus::single
//! [`Bus::keyed`]: crate::Bus::keyed
//! [`Bus::ordered`]: crate::Bus::ordered

use crate::policies::LockPolicy;

/// Construction-time configuration for a bus.
#[derive(Clone, Copy, Debug)]
pub struct BusConfig {
    /// Dispatch locking policy. Default: [`LockPolicy::None`]
    /// (single-threaded bus).
    pub lock: LockPolicy,
    /// Whether the bus carries an event queue at all. When `false`, every
    /// `queue_*` call returns [`QueueError::Disabled`](crate::QueueError::Disabled)
    /// and `execute_queued_events`/`clear_queued_events` are no-ops.
    pub queueing: bool,
    /// Whether the queue starts out accepting work. Only meaningful when
    /// `queueing` is `true`; toggled later via
    /// [`Bus::allow_function_queuing`](crate::Bus::allow_function_queuing).
    pub queueing_active: bool,
}

impl Default for BusConfig {
    /// Returns `{ lock: None, queueing: true, queueing_active: true }`.
    fn default() -> Self {
        Self {
            lock: LockPolicy::None,
            queueing: true,
            queueing_active: true,
        }
    }
}

impl BusConfig {
    /// Sets the dispatch locking policy.
    #[must_use]
    pub fn with_lock(mut self, lock: LockPolicy) -> Self {
        self.lock = lock;
        self
    }

    /// Enables or disables the event queue.
    #[must_use]
    pub fn with_queueing(mut self, queueing: bool) -> Self {
        self.queueing = queueing;
        self
    }

    /// Sets whether the queue starts out accepting work.
    #[must_use]
    pub fn with_queueing_active(mut self, active: bool) -> Self {
        self.queueing_active = active;
        self
    }
}
