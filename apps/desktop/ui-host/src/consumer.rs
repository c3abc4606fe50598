//! The UI thread's side of the command queue.

use control_core::dispatcher::{ControlCommandReceiver, ShutdownSink};
use control_core::queue::CommandQueue;

use models::ControlCommand;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, info};

/// How often the UI thread looks at the queue.
pub const CONSUMER_TICK: Duration = Duration::from_millis(16);

/// Drains [`CommandQueue`] on the thread that owns the browser.
///
/// The consumer is the queue's only reader. Each queued command is converted to
/// a [`ControlCommand`] and handed to the downstream receiver (normally the
/// dispatcher) on this thread.
pub struct UiConsumer {
    queue: Arc<CommandQueue>,
    downstream: Arc<dyn ControlCommandReceiver>,
    shutdown: Arc<dyn ShutdownSink>,
    tick: Duration,
}

impl UiConsumer {
    pub fn new(
        queue: Arc<CommandQueue>,
        downstream: Arc<dyn ControlCommandReceiver>,
        shutdown: Arc<dyn ShutdownSink>,
    ) -> Self {
        Self {
            queue,
            downstream,
            shutdown,
            tick: CONSUMER_TICK,
        }
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Deliver everything currently queued. Returns how many commands ran.
    ///
    /// Stops early once shutdown has been requested; commands behind it stay queued.
    pub fn drain(&self) -> usize {
        let mut delivered = 0;
        while !self.shutdown.is_shutdown_requested() {
            let Some(command) = self.queue.dequeue() else {
                break;
            };
            debug!("UI thread handling {command:?}");
            self.downstream.on_command(ControlCommand::from(command));
            delivered += 1;
        }
        delivered
    }

    /// Drain on every tick until the shutdown collaborator reports a request.
    pub fn run_until_shutdown(&self) {
        info!("UI consumer running (tick {:?})", self.tick);
        while !self.shutdown.is_shutdown_requested() {
            self.drain();
            if self.shutdown.is_shutdown_requested() {
                break;
            }
            thread::sleep(self.tick);
        }

        let pending = self.queue.len();
        if pending > 0 {
            info!("UI consumer exiting with {pending} command(s) not run");
        } else {
            info!("UI consumer exiting");
        }
        self.downstream.shutdown();
    }
}
