//! Address bookkeeping: handler lists and the container that routes ids to
//! them.
//!
//! ## Contents
//! - [`HandlerList`](list::HandlerList) insertion-ordered handlers at one
//!   address, safe to mutate while a dispatch walks a snapshot of it
//! - [`AddressContainer`](container::AddressContainer) maps a bus id (or the
//!   single implicit address) to its node
//! - [`AddressNode`](container::AddressNode) one address: its id plus its
//!   handler list
//! - [`NodePin`](container::NodePin) keeps a node registered while a cached
//!   address pointer or a pending queued entry holds it

mod container;
mod list;

pub(crate) use container::{AddressContainer, AddressNode, NodePin};
pub(crate) use list::HandlerList;
