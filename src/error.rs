//! Error types for the queueing surface.
//!
//! Dispatch itself never fails: dispatching on a bus with no handlers, or at
//! an address nobody is connected to, is a silent no-op by contract. The only
//! fallible operations are the `queue_*` family, which refuse to accept work
//! when queueing is disabled or currently switched off.

use thiserror::Error;

/// Errors returned by the `queue_*` operations.
///
/// Both variants leave the queue untouched: nothing is enqueued and nothing
/// already enqueued is affected.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// The bus was built with queueing disabled ([`BusConfig::queueing`] is
    /// `false`).
    ///
    /// [`BusConfig::queueing`]: crate::BusConfig::queueing
    #[error("event queueing is disabled for this bus")]
    Disabled,

    /// Queueing is enabled but currently inactive
    /// (see [`Bus::allow_function_queuing`]).
    ///
    /// [`Bus::allow_function_queuing`]: crate::Bus::allow_function_queuing
    #[error("event queueing is currently switched off")]
    Inactive,
}

impl QueueError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            QueueError::Disabled => "queue_disabled",
            QueueError::Inactive => "queue_inactive",
        }
    }
}
