//! Host reference runtime.
//!
//! Queues are worker threads, events are condition-variable flags and
//! buffers are shared vectors. Used for testing and as the default
//! execution target when no device runtime is linked.

mod buffer;
mod contract;
mod element;
mod event;
mod queue;

pub use buffer::{HostBuffer, HostStorage};
pub use element::Element;
pub use event::HostEvent;
pub use queue::HostQueue;

pub(crate) use contract::{contract, Offsets};

use super::traits::Backend;
use crate::tensor::DataType;

/// Host backend.
#[derive(Clone, Debug, Default)]
pub struct Host;

impl Backend for Host {
    type Event = HostEvent;
    type Queue = HostQueue;
    type Buffer = HostBuffer;

    fn name() -> &'static str {
        "host"
    }

    #[inline]
    fn buffer_len(buffer: &HostBuffer) -> usize {
        buffer.len()
    }

    #[inline]
    fn buffer_data_type(buffer: &HostBuffer) -> DataType {
        buffer.data_type()
    }
}
