//! Client-side connection lifecycle with bounded retry.

use crate::connection::channel::MessageChannel;
use crate::connection::listener::ConnectionListener;
use crate::connection::retry::{
    CONNECTION_TIMEOUT_MS, ConnectBackoff, MAX_BACKOFF_MS, MAX_RETRIES,
};
use crate::error::connection::ConnectionError;

use common::ErrorLocation;

use std::panic::Location;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use backoff::backoff::Backoff;
use log::{debug, error, info, warn};

/// Blocks the calling thread between connection attempts.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Snapshot of the retry bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryStats {
    pub retry_count: u32,
    pub max_retries: u32,
    pub current_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

/// Drives a [`MessageChannel`] through `Idle → Connecting → Connected` or,
/// after [`MAX_RETRIES`] consecutive failures, to a failed state.
///
/// [`connect`](Self::connect) blocks its caller for the whole backoff
/// sequence (up to 23 seconds). Run it on a dedicated thread when that matters.
///
/// Listener emission iterates a snapshot of the listener list, so adding or
/// removing listeners from inside a callback is safe.
///
/// [`is_ready`](Self::is_ready) reads atomics only. The channel lock is held
/// for one poll of [`MessageChannel::receive`] at a time, so a pending
/// [`receive_message`](Self::receive_message) delays `send_message` and
/// `disconnect` by at most one poll interval.
pub struct ConnectionManager<C: MessageChannel> {
    channel: Mutex<C>,
    connected: AtomicBool,
    channel_open: AtomicBool,
    retry_count: AtomicU32,
    current_backoff_ms: AtomicU64,
    listeners: RwLock<Vec<Arc<dyn ConnectionListener>>>,
    sleeper: Box<dyn Sleeper>,
}

impl<C: MessageChannel> ConnectionManager<C> {
    pub fn new(channel: C) -> Self {
        Self::with_sleeper(channel, ThreadSleeper)
    }

    pub fn with_sleeper(channel: C, sleeper: impl Sleeper + 'static) -> Self {
        Self {
            channel: Mutex::new(channel),
            connected: AtomicBool::new(false),
            channel_open: AtomicBool::new(false),
            retry_count: AtomicU32::new(0),
            current_backoff_ms: AtomicU64::new(0),
            listeners: RwLock::new(Vec::new()),
            sleeper: Box::new(sleeper),
        }
    }

    /// Connect, retrying on the fixed schedule.
    ///
    /// A no-op when already connected.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::RetriesExhausted`] after [`MAX_RETRIES`]
    /// consecutive failed attempts.
    pub fn connect(&self) -> Result<(), ConnectionError> {
        if self.connected.load(Ordering::SeqCst) {
            debug!("Already connected, connect is a no-op");
            return Ok(());
        }

        self.retry_count.store(0, Ordering::SeqCst);
        let mut backoff = ConnectBackoff::new();
        self.emit(|listener| listener.on_connecting());

        loop {
            let attempt = {
                let mut channel = self.lock_channel();
                if channel.is_connected() {
                    Ok(())
                } else {
                    channel.connect()
                }
            };

            let failure = match attempt {
                Ok(()) => {
                    self.channel_open.store(true, Ordering::SeqCst);
                    self.connected.store(true, Ordering::SeqCst);
                    self.current_backoff_ms.store(0, Ordering::SeqCst);
                    info!("Connected");
                    self.emit(|listener| listener.on_connected());
                    return Ok(());
                }
                Err(e) => e,
            };

            let retries = self.retry_count.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(delay) = backoff.next_backoff() {
                let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(MAX_BACKOFF_MS);
                self.current_backoff_ms.store(delay_ms, Ordering::SeqCst);
                warn!(
                    "Connection attempt {retries}/{MAX_RETRIES} failed: {failure}, backing off {delay_ms} ms"
                );
                self.sleeper.sleep(delay);
            }

            if retries >= MAX_RETRIES {
                let message = format!("Failed after {MAX_RETRIES} retries: {failure}");
                error!("{message}");
                self.emit(|listener| listener.on_error(&message));
                return Err(ConnectionError::RetriesExhausted {
                    message,
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }
    }

    /// Close the channel and notify listeners. A no-op when not connected.
    pub fn disconnect(&self) {
        if !self.connected.swap(false, Ordering::SeqCst) {
            return;
        }
        self.channel_open.store(false, Ordering::SeqCst);

        if let Err(e) = self.lock_channel().close() {
            warn!("Error while closing channel: {e}");
        }

        info!("Disconnected");
        self.emit(|listener| listener.on_disconnected());
    }

    /// Connected and the channel was usable after its last operation.
    pub fn is_ready(&self) -> bool {
        self.connected.load(Ordering::SeqCst) && self.channel_open.load(Ordering::SeqCst)
    }

    pub fn send_message(&self, message: &str) -> Result<(), ConnectionError> {
        self.ensure_ready()?;
        let mut channel = self.lock_channel();
        let result = channel.send(message);
        if result.is_err() {
            self.refresh_channel_open(&channel);
        }
        result
    }

    /// Block until a message arrives or the connection goes away.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::NotConnected`] once [`disconnect`](Self::disconnect)
    /// runs on another thread, or the channel's own error when it fails.
    pub fn receive_message(&self) -> Result<String, ConnectionError> {
        loop {
            self.ensure_ready()?;
            let polled = {
                let mut channel = self.lock_channel();
                let polled = channel.receive();
                if polled.is_err() {
                    self.refresh_channel_open(&channel);
                }
                polled
            };
            match polled? {
                Some(message) => return Ok(message),
                None => std::thread::yield_now(),
            }
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn ConnectionListener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    pub fn remove_listener(&self, listener: &Arc<dyn ConnectionListener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|registered| !std::ptr::addr_eq(Arc::as_ptr(registered), Arc::as_ptr(listener)));
    }

    pub fn retry_stats(&self) -> RetryStats {
        RetryStats {
            retry_count: self.retry_count.load(Ordering::SeqCst),
            max_retries: MAX_RETRIES,
            current_backoff_ms: self.current_backoff_ms.load(Ordering::SeqCst),
            max_backoff_ms: MAX_BACKOFF_MS,
        }
    }

    /// Advisory timeout for a single connection attempt.
    pub fn connection_timeout_ms(&self) -> u64 {
        CONNECTION_TIMEOUT_MS
    }

    #[track_caller]
    fn ensure_ready(&self) -> Result<(), ConnectionError> {
        if self.is_ready() {
            return Ok(());
        }
        Err(ConnectionError::NotConnected {
            message: "Not connected".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    fn refresh_channel_open(&self, channel: &C) {
        self.channel_open.store(channel.is_connected(), Ordering::SeqCst);
    }

    fn lock_channel(&self) -> MutexGuard<'_, C> {
        self.channel.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: impl Fn(&dyn ConnectionListener)) {
        let snapshot: Vec<Arc<dyn ConnectionListener>> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for listener in &snapshot {
            event(listener.as_ref());
        }
    }
}
