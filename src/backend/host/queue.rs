//! Host command queues: one worker thread per queue, commands run in FIFO order.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

use super::event::HostEvent;
use crate::backend::{Event, Queue};
use crate::status::{CobaltResult, Status};

type Work = Box<dyn FnOnce() + Send + 'static>;

enum Command {
    Run(Work),
    Wait(Vec<HostEvent>),
    Signal(HostEvent),
}

/// In-order queue backed by a dedicated worker thread.
///
/// Dropping the queue lets the worker drain outstanding commands, then joins it.
pub struct HostQueue {
    name: String,
    sender: Mutex<Option<Sender<Command>>>,
    worker: Option<JoinHandle<()>>,
    submitted: Arc<AtomicU64>,
    completed: Arc<AtomicU64>,
}

impl HostQueue {
    /// Spawn a queue whose worker thread is named `name`.
    pub fn new(name: impl Into<String>) -> CobaltResult<Self> {
        let name = name.into();
        let (sender, receiver) = mpsc::channel();
        let completed = Arc::new(AtomicU64::new(0));
        let worker_completed = Arc::clone(&completed);
        let worker_name = name.clone();

        let worker = thread::Builder::new()
            .name(name.clone())
            .spawn(move || run_worker(&worker_name, receiver, &worker_completed))
            .map_err(|e| {
                tracing::error!(queue = %name, error = %e, "failed to spawn queue worker");
                Status::ControlInvalid
            })?;

        tracing::debug!(queue = %name, "host queue created");
        Ok(Self {
            name,
            sender: Mutex::new(Some(sender)),
            worker: Some(worker),
            submitted: Arc::new(AtomicU64::new(0)),
            completed,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Submit `work` behind everything already on the queue.
    pub fn submit<F>(&self, work: F) -> CobaltResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.send(Command::Run(Box::new(work)))?;
        self.submitted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Number of work items submitted so far.
    pub fn num_submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    /// Number of work items the worker has finished.
    pub fn num_completed(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    fn send(&self, command: Command) -> CobaltResult<()> {
        let guard = self.sender.lock();
        let sender = guard.as_ref().ok_or(Status::ControlInvalid)?;
        sender.send(command).map_err(|_| {
            tracing::error!(queue = %self.name, "queue worker is gone");
            Status::ControlInvalid
        })
    }
}

fn run_worker(name: &str, receiver: Receiver<Command>, completed: &AtomicU64) {
    for command in receiver {
        match command {
            Command::Run(work) => {
                if catch_unwind(AssertUnwindSafe(work)).is_err() {
                    tracing::error!(queue = %name, "queued work panicked");
                }
                completed.fetch_add(1, Ordering::Release);
            }
            Command::Wait(events) => {
                for event in &events {
                    event.wait();
                }
            }
            Command::Signal(event) => event.complete(),
        }
    }
    tracing::trace!(queue = %name, "queue worker exiting");
}

impl Queue for HostQueue {
    type Event = HostEvent;

    fn wait_on(&self, events: &[HostEvent]) -> CobaltResult<()> {
        let pending: Vec<HostEvent> = events.iter().filter(|e| !e.is_complete()).cloned().collect();
        if pending.is_empty() {
            return Ok(());
        }
        self.send(Command::Wait(pending))
    }

    fn signal(&self) -> CobaltResult<HostEvent> {
        let event = HostEvent::new();
        self.send(Command::Signal(event.clone()))?;
        Ok(event)
    }
}

impl Drop for HostQueue {
    fn drop(&mut self) {
        // closing the channel ends the worker loop once it drains
        self.sender.lock().take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!(queue = %self.name, "queue worker panicked");
            }
        }
    }
}

impl std::fmt::Debug for HostQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostQueue")
            .field("name", &self.name)
            .field("submitted", &self.num_submitted())
            .field("completed", &self.num_completed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let queue = HostQueue::new("fifo").unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        for i in 0..6 {
            let log = Arc::clone(&log);
            queue.submit(move || log.lock().push(i)).unwrap();
        }
        queue.finish().unwrap();
        assert_eq!(*log.lock(), vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(queue.num_submitted(), 6);
        assert_eq!(queue.num_completed(), 6);
    }

    #[test]
    fn test_wait_on_other_queue() {
        let first = HostQueue::new("first").unwrap();
        let second = HostQueue::new("second").unwrap();
        let gate = HostEvent::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        second.wait_on(&[gate.clone()]).unwrap();
        let l = Arc::clone(&log);
        second.submit(move || l.lock().push("second")).unwrap();

        let l = Arc::clone(&log);
        first.submit(move || l.lock().push("first")).unwrap();
        first.finish().unwrap();
        gate.complete();
        second.finish().unwrap();

        assert_eq!(*log.lock(), vec!["first", "second"]);
    }

    #[test]
    fn test_panicking_work_does_not_kill_queue() {
        let queue = HostQueue::new("panics").unwrap();
        queue.submit(|| panic!("boom")).unwrap();
        let ran = Arc::new(Mutex::new(false));
        let r = Arc::clone(&ran);
        queue.submit(move || *r.lock() = true).unwrap();
        queue.finish().unwrap();
        assert!(*ran.lock());
    }

    #[test]
    fn test_signal_completes_after_prior_work() {
        let queue = HostQueue::new("signal").unwrap();
        let gate = HostEvent::new();
        queue.wait_on(&[gate.clone()]).unwrap();
        let event = queue.signal().unwrap();
        assert!(!event.is_complete());
        gate.complete();
        event.wait();
        assert!(event.is_complete());
    }
}
