//! Backend abstractions for asynchronous execution.
//!
//! This module defines the capability traits dispatch is written against
//! and one implementation:
//! - [`Host`]: worker-thread queues over host memory

mod host;
mod traits;

pub use host::{Element, Host, HostBuffer, HostEvent, HostQueue, HostStorage};
pub(crate) use host::{contract, Offsets};
pub use traits::{Backend, Event, Queue};
