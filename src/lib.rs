//! # relaybus
//!
//! **Relaybus** is a synchronous publish/subscribe and request-dispatch
//! library for Rust.
//!
//! It lets decoupled subsystems communicate through named, typed buses
//! without interface coupling at the call site: callers dispatch operations
//! against a handler trait, and whoever is connected — at one address or
//! across all of them — gets invoked, in a defined order, on the calling
//! thread.
//!
//! ## Architecture
//! ```text
//!     caller                         caller                    caller
//!        │ broadcast(op)                │ event(id, op)           │ queue_event(id, op)
//!        ▼                              ▼                         ▼
//! ┌───────────────────────────────────────────────────────────────────────┐
//! │  Bus (shared context, cheap to clone)                                 │
//! │  - RouterChain (interceptors may claim a call)                        │
//! │  - DispatchLock (none / mutex / reentrant, per LockPolicy)            │
//! │  - AddressContainer (single / hash-keyed / ordered)                   │
//! │  - EventQueue (deferred closures, own push-lock)                      │
//! └──────┬─────────────────────┬────────────────────────┬─────────────────┘
//!        ▼                     ▼                        ▼
//!   [address A]           [address B]             backlog ─► execute_queued_events()
//!   H1 ─► H2 ─► H3        H4 ─► H5                          (drains via the
//!   (connection order)                                       same paths)
//! ```
//!
//! ## Guarantees
//! - Dispatch is synchronous and blocking; `queue_*` calls only enqueue.
//! - Handlers at one address run in connection order (reverse variants in
//!   its true reverse at dispatch time).
//! - Result variants are **last handler wins**; zero handlers yields `None`.
//! - Dispatching with nobody connected is a silent no-op, never an error.
//! - A handler disconnecting itself mid-dispatch never skips or repeats any
//!   other handler.
//! - Ordered buses broadcast across addresses in ascending id order; keyed
//!   buses in unspecified order.
//!
//! ## Non-guarantees
//! - Whether a handler connected mid-dispatch is visited by that dispatch is
//!   unspecified; do not rely on either behavior.
//! - Dispatch is not cancellable; a hung handler hangs the calling thread.
//! - Under [`LockPolicy::Mutex`], reentering the bus from a handler
//!   deadlocks by design; use [`LockPolicy::Reentrant`] for reentrant buses.
//!
//! ## Features
//! | Area            | Description                                              | Key types                      |
//! |-----------------|----------------------------------------------------------|--------------------------------|
//! | **Dispatch**    | Broadcast/event, result-collecting, reverse-ordered.     | [`Bus`]                        |
//! | **Addressing**  | Single, hash-keyed, or ordered addresses.                | [`Bus`], [`BusId`]             |
//! | **Queueing**    | Defer calls; drain them on a thread of your choosing.    | [`Bus::execute_queued_events`] |
//! | **Routing**     | Intercept and claim calls before handlers see them.      | [`Router`]                     |
//! | **Locking**     | Per-bus choice: none, mutex, or reentrant.               | [`LockPolicy`], [`BusConfig`]  |
//! | **Fast re-dispatch** | Resolve an address once, dispatch many times.       | [`AddressPtr`]                 |
//!
//! ## Example
//! ```
//! use std::sync::Arc;
//! use relaybus::{Bus, BusConfig};
//!
//! trait DocumentEvents: Send + Sync {
//!     fn on_modified(&self, revision: u64);
//!     fn version(&self) -> u64;
//! }
//!
//! struct Tracker(u64);
//! impl DocumentEvents for Tracker {
//!     fn on_modified(&self, revision: u64) {
//!         let _ = revision;
//!     }
//!     fn version(&self) -> u64 {
//!         self.0
//!     }
//! }
//!
//! // One bus per document id; broadcasts visit documents in id order.
//! let bus: Bus<dyn DocumentEvents, u32> = Bus::ordered(BusConfig::default());
//! let _doc7 = bus.connect_at(7, Arc::new(Tracker(1)));
//! let _doc3 = bus.connect_at(3, Arc::new(Tracker(2)));
//!
//! // Addressed request: ask document 3 for its version (last handler wins).
//! assert_eq!(bus.event_result(&3, |h| h.version()), Some(2));
//! assert_eq!(bus.event_result(&99, |h| h.version()), None);
//!
//! // Broadcast to every document.
//! bus.broadcast(|h| h.on_modified(42));
//! ```

mod address;
mod bus;
mod config;
mod core;
mod error;
mod policies;
mod queue;
mod router;

// ---- Public re-exports ----

pub use bus::{AddressPtr, Bus, BusId, Connection};
pub use config::BusConfig;
pub use error::QueueError;
pub use policies::LockPolicy;
pub use router::{Router, RouterDisposition};
