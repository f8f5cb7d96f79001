//! Execution control and asynchronous dispatch.

use std::fmt;

use crate::backend::{Backend, Queue};
use crate::solution::SolutionHandle;
use crate::status::{CobaltResult, Status};
use crate::tensor::TensorDescriptor;

/// Maximum number of queues in one [`ExecutionControl`].
pub const MAX_QUEUES: usize = 16;

/// Maximum number of input dependencies of one dispatch.
pub const MAX_DEPENDENCIES: usize = 64;

/// A device buffer and the element offset a tensor starts at.
pub struct TensorData<B: Backend> {
    pub buffer: B::Buffer,
    pub offset: usize,
}

impl<B: Backend> TensorData<B> {
    pub fn new(buffer: B::Buffer) -> Self {
        Self { buffer, offset: 0 }
    }

    pub fn with_offset(buffer: B::Buffer, offset: usize) -> Self {
        Self { buffer, offset }
    }

    /// Whether the buffer holds `tensor`'s element type and covers its
    /// extent past the offset.
    pub fn fits(&self, tensor: &TensorDescriptor) -> bool {
        B::buffer_data_type(&self.buffer) == tensor.data_type()
            && self
                .offset
                .checked_add(tensor.extent())
                .is_some_and(|end| end <= B::buffer_len(&self.buffer))
    }
}

impl<B: Backend> Clone for TensorData<B> {
    fn clone(&self) -> Self {
        Self {
            buffer: self.buffer.clone(),
            offset: self.offset,
        }
    }
}

impl<B: Backend> fmt::Debug for TensorData<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TensorData")
            .field("len", &B::buffer_len(&self.buffer))
            .field("data_type", &B::buffer_data_type(&self.buffer))
            .field("offset", &self.offset)
            .finish()
    }
}

/// Queues and dependency events for one dispatch.
///
/// Work is submitted to the first queue. Each requested output event comes
/// from a distinct queue, so at most `queues.len()` can be requested. The
/// control may be reused; every dispatch replaces the output events.
pub struct ExecutionControl<'a, B: Backend> {
    queues: &'a [B::Queue],
    input_events: Vec<B::Event>,
    num_output_events: usize,
    output_events: Vec<B::Event>,
}

impl<'a, B: Backend> ExecutionControl<'a, B> {
    pub fn new(queues: &'a [B::Queue]) -> Self {
        Self {
            queues,
            input_events: Vec::new(),
            num_output_events: 0,
            output_events: Vec::new(),
        }
    }

    /// Events that must complete before the work starts.
    pub fn with_input_events(mut self, events: Vec<B::Event>) -> Self {
        self.input_events = events;
        self
    }

    /// Number of completion events to produce.
    pub fn with_output_events(mut self, count: usize) -> Self {
        self.num_output_events = count;
        self
    }

    pub fn set_input_events(&mut self, events: Vec<B::Event>) {
        self.input_events = events;
    }

    #[inline]
    pub fn queues(&self) -> &'a [B::Queue] {
        self.queues
    }

    #[inline]
    pub fn num_queues(&self) -> usize {
        self.queues.len()
    }

    pub fn input_events(&self) -> &[B::Event] {
        &self.input_events
    }

    /// Completion events of the last dispatch.
    pub fn output_events(&self) -> &[B::Event] {
        &self.output_events
    }

    pub fn take_output_events(&mut self) -> Vec<B::Event> {
        std::mem::take(&mut self.output_events)
    }

    fn check(&self) -> CobaltResult<()> {
        if self.queues.is_empty() || self.queues.len() > MAX_QUEUES {
            return Err(Status::ControlInvalid);
        }
        if self.num_output_events > self.queues.len() || self.input_events.len() > MAX_DEPENDENCIES {
            return Err(Status::DependencyInvalid);
        }
        Ok(())
    }
}

impl<B: Backend> fmt::Debug for ExecutionControl<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionControl")
            .field("num_queues", &self.queues.len())
            .field("input_events", &self.input_events.len())
            .field("num_output_events", &self.num_output_events)
            .finish()
    }
}

/// Enqueue one execution of `handle` on `control`'s queues.
///
/// Returns once the work is submitted. The result carries the handle's
/// selection status, so a performance warning is repeated on every
/// dispatch without blocking it. Control and buffer errors are reported
/// before anything is enqueued.
///
/// # Errors
///
/// - `ControlInvalid`: no queues, more than [`MAX_QUEUES`], a buffer
///   that does not back its tensor, or operands the solution refuses
///   (for the host, an output aliasing an input or mixed element types)
/// - `DependencyInvalid`: more output events than queues, or more than
///   [`MAX_DEPENDENCIES`] input events
pub fn enqueue_solution<B: Backend>(
    handle: &SolutionHandle<B>,
    c: &TensorData<B>,
    a: &TensorData<B>,
    b: &TensorData<B>,
    control: &mut ExecutionControl<'_, B>,
) -> CobaltResult<Status> {
    control.check()?;

    let problem = handle.problem();
    for (data, tensor, operand) in [
        (c, problem.tensor_c(), "C"),
        (a, problem.tensor_a(), "A"),
        (b, problem.tensor_b(), "B"),
    ] {
        if !data.fits(tensor) {
            tracing::debug!(operand, ?data, extent = tensor.extent(), "buffer does not back tensor");
            return Err(Status::ControlInvalid);
        }
    }

    handle.solution().check_operands(problem, c, a, b)?;

    let queues = control.queues;
    let primary = &queues[0];
    primary.wait_on(&control.input_events)?;
    handle.solution().enqueue(problem, c, a, b, primary)?;

    control.output_events.clear();
    if control.num_output_events > 0 {
        let done = primary.signal()?;
        let mut events = Vec::with_capacity(control.num_output_events);
        for queue in &queues[1..control.num_output_events] {
            queue.wait_on(std::slice::from_ref(&done))?;
            events.push(queue.signal()?);
        }
        events.insert(0, done);
        control.output_events = events;
    }

    tracing::trace!(
        solution = handle.name(),
        inputs = control.input_events.len(),
        outputs = control.output_events.len(),
        "enqueued"
    );
    Ok(handle.status())
}
