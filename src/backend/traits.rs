//! Backend trait definitions.
//!
//! Selection and validation never touch a device; only dispatch does, and
//! only through these capabilities.

use crate::status::CobaltResult;
use crate::tensor::DataType;

/// Completion marker produced by [`Queue::signal`].
pub trait Event: Clone + Send + Sync + 'static {
    /// Whether all work preceding the signal has finished.
    fn is_complete(&self) -> bool;

    /// Block the calling thread until the event completes.
    fn wait(&self);
}

/// In-order command queue.
///
/// Commands on one queue execute in submission order. Commands on different
/// queues are unordered unless linked with [`Queue::wait_on`].
pub trait Queue: Send + Sync {
    type Event: Event;

    /// Hold back later commands until every event in `events` has completed.
    fn wait_on(&self, events: &[Self::Event]) -> CobaltResult<()>;

    /// Event that completes once all previously submitted commands have run.
    fn signal(&self) -> CobaltResult<Self::Event>;

    /// Block until the queue has drained.
    fn finish(&self) -> CobaltResult<()> {
        self.signal()?.wait();
        Ok(())
    }
}

/// Device runtime that solutions execute on.
///
/// Defines the resource types dispatch passes through: queues, events and
/// device buffers.
pub trait Backend: Send + Sync + 'static {
    type Event: Event;
    type Queue: Queue<Event = Self::Event>;
    /// Device memory handle.
    type Buffer: Clone + Send + Sync;

    /// Backend name for debugging.
    fn name() -> &'static str;

    /// Buffer capacity in elements.
    fn buffer_len(buffer: &Self::Buffer) -> usize;

    /// Element type stored in the buffer.
    fn buffer_data_type(buffer: &Self::Buffer) -> DataType;
}
