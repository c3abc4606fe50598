use crate::connection::{
    BACKOFF_SCHEDULE_MS, ConnectBackoff, ConnectionListener, ConnectionManager, MAX_RETRIES,
    MessageChannel, Sleeper,
};
use crate::error::connection::ConnectionError;

use common::ErrorLocation;

use std::collections::VecDeque;
use std::panic::Location;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use backoff::backoff::Backoff;

/// Channel whose connect fails a fixed number of times, then succeeds.
struct ScriptedChannel {
    failures_left: usize,
    attempts: Arc<AtomicUsize>,
    connected: bool,
    inbox: VecDeque<String>,
    sent: Arc<Mutex<Vec<String>>>,
}

impl ScriptedChannel {
    fn failing(failures: usize) -> Self {
        Self {
            failures_left: failures,
            attempts: Arc::new(AtomicUsize::new(0)),
            connected: false,
            inbox: VecDeque::new(),
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MessageChannel for ScriptedChannel {
    fn connect(&mut self) -> Result<(), ConnectionError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failures_left > 0 {
            self.failures_left -= 1;
            return Err(ConnectionError::Transport {
                message: "connection refused".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        self.connected = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn send(&mut self, message: &str) -> Result<(), ConnectionError> {
        self.sent.lock().unwrap().push(message.to_string());
        self.inbox.push_back(format!("echo:{message}"));
        Ok(())
    }

    fn receive(&mut self) -> Result<Option<String>, ConnectionError> {
        self.inbox.pop_front().map(Some).ok_or_else(|| ConnectionError::Transport {
            message: "nothing to read".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    fn close(&mut self) -> Result<(), ConnectionError> {
        self.connected = false;
        Ok(())
    }
}

/// Channel whose receive never yields a message; each poll takes `poll` to time out.
struct IdleChannel {
    poll: Duration,
    open: Arc<AtomicBool>,
}

impl IdleChannel {
    fn new(poll: Duration) -> Self {
        Self {
            poll,
            open: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl MessageChannel for IdleChannel {
    fn connect(&mut self) -> Result<(), ConnectionError> {
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn send(&mut self, _message: &str) -> Result<(), ConnectionError> {
        Ok(())
    }

    fn receive(&mut self) -> Result<Option<String>, ConnectionError> {
        std::thread::sleep(self.poll);
        Ok(None)
    }

    fn close(&mut self) -> Result<(), ConnectionError> {
        self.open.store(false, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Clone, Default)]
struct RecordingSleeper {
    delays: Arc<Mutex<Vec<Duration>>>,
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

#[derive(Default)]
struct RecordingListener {
    events: Mutex<Vec<String>>,
}

impl ConnectionListener for RecordingListener {
    fn on_connecting(&self) {
        self.events.lock().unwrap().push("connecting".to_string());
    }

    fn on_connected(&self) {
        self.events.lock().unwrap().push("connected".to_string());
    }

    fn on_disconnected(&self) {
        self.events.lock().unwrap().push("disconnected".to_string());
    }

    fn on_error(&self, message: &str) {
        self.events.lock().unwrap().push(format!("error:{message}"));
    }
}

impl RecordingListener {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

/// **VALUE**: Verifies the retry schedule: five attempts, five delays in order, no sixth attempt.
///
/// **WHY THIS MATTERS**: Controllers size their own timeouts around the 23 second worst case.
/// An extra attempt or a different curve breaks that budget.
///
/// **BUG THIS CATCHES**: Would catch an off-by-one in the retry ceiling, a schedule that keeps
/// doubling past 8 s, or a missing sleep.
#[test]
fn given_always_failing_channel_when_connect_then_five_attempts_with_fixed_backoff() {
    // GIVEN: A channel that never connects
    let channel = ScriptedChannel::failing(usize::MAX);
    let attempts = Arc::clone(&channel.attempts);
    let sleeper = RecordingSleeper::default();
    let manager = ConnectionManager::with_sleeper(channel, sleeper.clone());
    let listener = Arc::new(RecordingListener::default());
    manager.add_listener(listener.clone());

    // WHEN
    let result = manager.connect();

    // THEN: Retries exhausted
    match result {
        Err(ConnectionError::RetriesExhausted { message, .. }) => {
            assert!(message.starts_with("Failed after 5 retries"), "got: {message}");
        }
        other => panic!("Expected RetriesExhausted, got {other:?}"),
    }
    assert_eq!(attempts.load(Ordering::SeqCst), MAX_RETRIES as usize);

    let delays: Vec<u64> = sleeper
        .delays
        .lock()
        .unwrap()
        .iter()
        .map(|d| d.as_millis() as u64)
        .collect();
    assert_eq!(delays, vec![1000, 2000, 4000, 8000, 8000]);

    let events = listener.events();
    assert_eq!(events.first().map(String::as_str), Some("connecting"));
    assert!(events.last().is_some_and(|e| e.starts_with("error:")));
    assert!(!events.iter().any(|e| e == "connected"));

    let stats = manager.retry_stats();
    assert_eq!(stats.retry_count, 5);
    assert_eq!(stats.max_retries, 5);
    assert_eq!(stats.max_backoff_ms, 8000);
    assert!(!manager.is_ready());
}

/// **VALUE**: Verifies a transient failure is retried and then succeeds.
///
/// **WHY THIS MATTERS**: The host may still be starting when the controller first connects.
///
/// **BUG THIS CATCHES**: Would catch success not resetting the backoff or not emitting
/// `connected`.
#[test]
fn given_channel_failing_twice_when_connect_then_connects_on_third_attempt() {
    // GIVEN
    let channel = ScriptedChannel::failing(2);
    let attempts = Arc::clone(&channel.attempts);
    let sleeper = RecordingSleeper::default();
    let manager = ConnectionManager::with_sleeper(channel, sleeper.clone());
    let listener = Arc::new(RecordingListener::default());
    manager.add_listener(listener.clone());

    // WHEN
    manager.connect().expect("third attempt should succeed");

    // THEN
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert_eq!(
        *sleeper.delays.lock().unwrap(),
        vec![Duration::from_millis(1000), Duration::from_millis(2000)]
    );
    assert_eq!(listener.events(), vec!["connecting", "connected"]);
    assert!(manager.is_ready());
    assert_eq!(manager.retry_stats().current_backoff_ms, 0);
}

/// **VALUE**: Verifies connect is a no-op when already connected.
///
/// **WHY THIS MATTERS**: Callers may call connect defensively before each send.
///
/// **BUG THIS CATCHES**: Would catch a second connect re-dialling or re-emitting events.
#[test]
fn given_connected_manager_when_connect_again_then_nothing_happens() {
    let channel = ScriptedChannel::failing(0);
    let attempts = Arc::clone(&channel.attempts);
    let manager = ConnectionManager::with_sleeper(channel, RecordingSleeper::default());
    let listener = Arc::new(RecordingListener::default());
    manager.add_listener(listener.clone());

    manager.connect().unwrap();
    manager.connect().unwrap();

    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert_eq!(listener.events(), vec!["connecting", "connected"]);
}

/// **VALUE**: Verifies send and receive require a ready connection.
///
/// **WHY THIS MATTERS**: There is no implicit reconnect; callers must see "not connected"
/// instead of a hang or a silent drop.
///
/// **BUG THIS CATCHES**: Would catch send reaching a closed channel.
#[test]
fn given_disconnected_manager_when_send_or_receive_then_not_connected() {
    // GIVEN
    let channel = ScriptedChannel::failing(0);
    let sent = Arc::clone(&channel.sent);
    let manager = ConnectionManager::with_sleeper(channel, RecordingSleeper::default());

    // WHEN/THEN: Before connect
    assert!(matches!(
        manager.send_message("hi"),
        Err(ConnectionError::NotConnected { .. })
    ));
    assert!(matches!(
        manager.receive_message(),
        Err(ConnectionError::NotConnected { .. })
    ));

    // WHEN/THEN: Connected round trip
    manager.connect().unwrap();
    manager.send_message("hi").unwrap();
    assert_eq!(manager.receive_message().unwrap(), "echo:hi");

    // WHEN/THEN: After disconnect
    manager.disconnect();
    assert!(manager.send_message("again").is_err());
    assert_eq!(*sent.lock().unwrap(), vec!["hi".to_string()]);
}

/// **VALUE**: Verifies disconnect emits once and is a no-op when already disconnected.
///
/// **WHY THIS MATTERS**: Observers use `disconnected` to tear down UI state; duplicate events
/// double the teardown.
///
/// **BUG THIS CATCHES**: Would catch disconnect emitting unconditionally.
#[test]
fn given_connected_manager_when_disconnect_twice_then_single_event() {
    let manager = ConnectionManager::with_sleeper(ScriptedChannel::failing(0), RecordingSleeper::default());
    let listener = Arc::new(RecordingListener::default());
    manager.add_listener(listener.clone());

    manager.disconnect();
    manager.connect().unwrap();
    manager.disconnect();
    manager.disconnect();

    assert_eq!(
        listener.events(),
        vec!["connecting", "connected", "disconnected"]
    );
    assert!(!manager.is_ready());
}

/// **VALUE**: Verifies a removed listener receives no further events.
///
/// **WHY THIS MATTERS**: Listeners are removed when their owner goes away; late callbacks would
/// touch dead state.
///
/// **BUG THIS CATCHES**: Would catch removal matching the wrong listener or not at all.
#[test]
fn given_removed_listener_when_events_emitted_then_it_sees_nothing() {
    let manager = ConnectionManager::with_sleeper(ScriptedChannel::failing(0), RecordingSleeper::default());
    let kept = Arc::new(RecordingListener::default());
    let removed = Arc::new(RecordingListener::default());
    let removed_dyn: Arc<dyn ConnectionListener> = removed.clone();
    manager.add_listener(kept.clone());
    manager.add_listener(removed_dyn.clone());

    manager.remove_listener(&removed_dyn);
    manager.connect().unwrap();

    assert_eq!(kept.events(), vec!["connecting", "connected"]);
    assert!(removed.events().is_empty());
}

#[test]
fn given_connect_backoff_when_exhausted_then_yields_none_until_reset() {
    let mut backoff = ConnectBackoff::new();
    let delays: Vec<u64> = std::iter::from_fn(|| backoff.next_backoff())
        .map(|d| d.as_millis() as u64)
        .collect();
    assert_eq!(delays, BACKOFF_SCHEDULE_MS.to_vec());

    backoff.reset();
    assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(1000)));
}

#[test]
fn given_manager_when_connection_timeout_queried_then_is_thirty_seconds() {
    let manager = ConnectionManager::new(ScriptedChannel::failing(0));
    assert_eq!(manager.connection_timeout_ms(), 30_000);
}

/// **VALUE**: Verifies a pending receive does not stall readiness checks or disconnect.
///
/// **WHY THIS MATTERS**: Controllers poll `is_ready` from a UI thread while a reader thread
/// waits for replies. Holding the channel for the whole wait would freeze the UI and make
/// disconnect hang until a message happened to arrive.
///
/// **BUG THIS CATCHES**: Would catch the channel lock being held across an unbounded read,
/// or `is_ready` taking that lock at all.
#[test]
fn given_receive_pending_when_is_ready_and_disconnect_called_then_both_return_promptly() {
    // GIVEN: A reader thread parked in receive_message on a silent channel
    let channel = IdleChannel::new(Duration::from_millis(50));
    let open = Arc::clone(&channel.open);
    let manager = Arc::new(ConnectionManager::with_sleeper(channel, RecordingSleeper::default()));
    manager.connect().unwrap();

    let reader = {
        let manager = Arc::clone(&manager);
        std::thread::spawn(move || manager.receive_message())
    };
    std::thread::sleep(Duration::from_millis(120));

    // WHEN: Readiness is queried while the reader holds a poll
    let started = Instant::now();
    let ready = manager.is_ready();
    let ready_elapsed = started.elapsed();

    // THEN: Answered from atomics, without waiting on the reader
    assert!(ready);
    assert!(ready_elapsed < Duration::from_millis(20), "is_ready took {ready_elapsed:?}");

    // WHEN: Disconnect from this thread
    let started = Instant::now();
    manager.disconnect();
    let disconnect_elapsed = started.elapsed();

    // THEN: Waits at most one poll, and the reader wakes with NotConnected
    assert!(
        disconnect_elapsed < Duration::from_millis(500),
        "disconnect took {disconnect_elapsed:?}"
    );
    assert!(!open.load(Ordering::SeqCst));
    assert!(!manager.is_ready());
    let received = reader.join().unwrap();
    assert!(
        matches!(received, Err(ConnectionError::NotConnected { .. })),
        "got {received:?}"
    );
}
