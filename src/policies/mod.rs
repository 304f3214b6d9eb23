//! Locking policies for bus dispatch.
//!
//! The locking policy is the knob that controls **how much** a bus pays for
//! thread safety and **whether** handlers may reenter the bus from inside
//! their own invocation.
//!
//! ## Contents
//! - [`LockPolicy`] which dispatch lock a bus uses (none / mutex / reentrant)
//! - [`DispatchLock`](lock::DispatchLock) the lock instance behind one RAII
//!   guard type (crate-internal)
//!
//! ## Choosing the right policy
//! ```text
//! LockPolicy::None      → single-threaded bus, zero lock overhead
//! LockPolicy::Mutex     → cross-thread bus, handlers must NOT reenter it
//! LockPolicy::Reentrant → cross-thread bus, handlers may dispatch or
//!                         connect/disconnect on the same bus
//! ```

mod lock;

pub(crate) use lock::DispatchLock;
pub use lock::LockPolicy;
