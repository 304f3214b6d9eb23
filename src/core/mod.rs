//! Dispatch core: the shared per-bus context and the algorithms that walk it.
//!
//! ## Contents
//! - [`context`] the per-bus state: address container, event queue, router
//!   chain, and the dispatch lock
//! - [`dispatch`] the broadcast/event/result/reverse walks and the read-only
//!   enumeration paths

pub(crate) mod context;
pub(crate) mod dispatch;

pub(crate) use context::BusContext;
