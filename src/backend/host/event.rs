//! Host completion events.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Condvar, Mutex};

use crate::backend::Event;

#[derive(Debug, Default)]
struct EventState {
    completed_at: Mutex<Option<Instant>>,
    cond: Condvar,
}

/// One-shot completion flag shared between a queue worker and waiters.
///
/// Clones observe the same completion. Completion records the instant it
/// happened so callers can order and time finished work.
#[derive(Debug, Clone, Default)]
pub struct HostEvent {
    state: Arc<EventState>,
}

impl HostEvent {
    /// A pending event.
    pub fn new() -> Self {
        Self::default()
    }

    /// An event that is already complete.
    pub fn completed() -> Self {
        let event = Self::new();
        event.complete();
        event
    }

    /// Mark complete and wake all waiters. Later calls are no-ops.
    pub fn complete(&self) {
        let mut done = self.state.completed_at.lock();
        if done.is_none() {
            *done = Some(Instant::now());
            self.state.cond.notify_all();
        }
    }

    /// When the event completed, if it has.
    pub fn completed_at(&self) -> Option<Instant> {
        *self.state.completed_at.lock()
    }

    /// Whether two handles refer to the same event.
    pub fn same_as(&self, other: &HostEvent) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl Event for HostEvent {
    fn is_complete(&self) -> bool {
        self.state.completed_at.lock().is_some()
    }

    fn wait(&self) {
        let mut done = self.state.completed_at.lock();
        while done.is_none() {
            self.state.cond.wait(&mut done);
        }
    }
}
