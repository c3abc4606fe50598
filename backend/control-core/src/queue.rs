//! Multi-producer, single-consumer command queue.
//!
//! Producers (control sessions, file pollers) push from any thread. The
//! designated UI consumer drains it without ever blocking on an empty queue.

use models::Command;

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use log::trace;

/// Unbounded FIFO hand-off between producers and the UI consumer.
///
/// One mutex guards both ends. Enqueue order is dequeue order; there is no
/// priority and no de-duplication.
#[derive(Debug, Default)]
pub struct CommandQueue {
    inner: Mutex<VecDeque<Command>>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a command. Never fails.
    pub fn enqueue(&self, command: Command) {
        trace!("Enqueuing command: {:?}", command);
        self.lock().push_back(command);
    }

    /// Removes and returns the oldest command, or `None` when empty.
    pub fn dequeue(&self) -> Option<Command> {
        self.lock().pop_front()
    }

    /// Advisory only; may be stale by the time the caller acts on it.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Advisory only; may be stale by the time the caller acts on it.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    // A poisoned lock still holds a consistent VecDeque; keep serving it.
    fn lock(&self) -> MutexGuard<'_, VecDeque<Command>> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
