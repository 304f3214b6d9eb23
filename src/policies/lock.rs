//! # Dispatch lock policies.
//!
//! [`LockPolicy`] selects the lock a bus acquires around dispatch and
//! connect/disconnect. The choice is made once, when the bus is built, and
//! every guarantee the bus makes about concurrent use follows from it.
//!
//! - [`LockPolicy::None`] the "lock" is a no-op guard. The bus assumes
//!   single-threaded use; concurrent access is a caller bug, not a detected
//!   error.
//! - [`LockPolicy::Mutex`] one non-reentrant lock serializes dispatch and
//!   connect/disconnect. A handler that dispatches, connects, or disconnects
//!   **on the same bus from inside its own invocation will deadlock**. That
//!   is the documented trade-off of this policy, not a bug.
//! - [`LockPolicy::Reentrant`] same serialization across threads, but the
//!   owning thread may re-acquire the lock. The only safe policy for buses
//!   whose handlers reenter the bus.

use parking_lot::{Mutex, MutexGuard, ReentrantMutex, ReentrantMutexGuard};

/// Policy controlling which lock a bus acquires around dispatch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LockPolicy {
    /// No locking: the bus asserts single-threaded usage (default).
    #[default]
    None,
    /// One non-reentrant lock. Reentering the bus from a handler deadlocks.
    Mutex,
    /// A reentrant lock. Handlers may dispatch and connect/disconnect on the
    /// same bus from inside their own invocation.
    Reentrant,
}

/// The lock instance selected by a bus's [`LockPolicy`].
///
/// Acquired for the full duration of a dispatch call (handler invocations
/// included) and for the structural part of connect/disconnect. Released by
/// RAII on every exit path, unwinding included.
pub(crate) enum DispatchLock {
    None,
    Plain(Mutex<()>),
    Reentrant(ReentrantMutex<()>),
}

/// RAII guard for [`DispatchLock`]. Dropping it releases the lock.
pub(crate) enum DispatchGuard<'a> {
    None,
    Plain(#[allow(dead_code)] MutexGuard<'a, ()>),
    Reentrant(#[allow(dead_code)] ReentrantMutexGuard<'a, ()>),
}

impl DispatchLock {
    pub(crate) fn new(policy: LockPolicy) -> Self {
        match policy {
            LockPolicy::None => DispatchLock::None,
            LockPolicy::Mutex => DispatchLock::Plain(Mutex::new(())),
            LockPolicy::Reentrant => DispatchLock::Reentrant(ReentrantMutex::new(())),
        }
    }

    /// Acquires the lock, blocking until available. No-op under
    /// [`LockPolicy::None`].
    pub(crate) fn lock(&self) -> DispatchGuard<'_> {
        match self {
            DispatchLock::None => DispatchGuard::None,
            DispatchLock::Plain(m) => DispatchGuard::Plain(m.lock()),
            DispatchLock::Reentrant(m) => DispatchGuard::Reentrant(m.lock()),
        }
    }
}
