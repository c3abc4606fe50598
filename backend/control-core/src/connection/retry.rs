//! Fixed connect retry schedule.

use std::time::Duration;

use backoff::backoff::Backoff;

/// Delay after each failed attempt, in order.
pub const BACKOFF_SCHEDULE_MS: [u64; 5] = [1000, 2000, 4000, 8000, 8000];
pub const MAX_RETRIES: u32 = 5;
pub const MAX_BACKOFF_MS: u64 = 8000;
pub const CONNECTION_TIMEOUT_MS: u64 = 30_000;

/// Walks [`BACKOFF_SCHEDULE_MS`] once, then yields `None`.
#[derive(Debug, Clone, Default)]
pub struct ConnectBackoff {
    position: usize,
}

impl ConnectBackoff {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Backoff for ConnectBackoff {
    fn reset(&mut self) {
        self.position = 0;
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        let delay_ms = BACKOFF_SCHEDULE_MS.get(self.position)?;
        self.position += 1;
        Some(Duration::from_millis(*delay_ms))
    }
}
