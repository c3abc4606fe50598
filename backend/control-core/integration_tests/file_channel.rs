use crate::helpers::RecordingReceiver;

use control_core::dispatcher::{BrowserControl, ControlCommandDispatcher, ShutdownSink};
use control_core::error::dispatch::DispatchError;
use control_core::error::file_channel::FileChannelError;
use control_core::file_channel::{
    FileEncryptedCommandReceiver, FileEncryptedCommandWriter, POLL_INTERVAL,
};

use models::{ControlCommandBuilder, ControlCommandType};

use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tempfile::TempDir;

const WAIT: Duration = Duration::from_secs(3);

fn test_key() -> String {
    BASE64.encode([42u8; 32])
}

// Push the mtime forward so back-to-back writes inside one clock tick still register.
fn bump_mtime(path: &Path, seconds: u64) {
    let file = File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(seconds))
        .unwrap();
}

/// **VALUE**: Verifies an encrypted command written to the file reaches the downstream receiver.
///
/// **WHY THIS MATTERS**: This is the whole file channel: writer, AES-GCM framing, polling,
/// envelope decoding and delivery.
///
/// **BUG THIS CATCHES**: Would catch a framing mismatch between writer and receiver, a poller
/// that never starts, or payload loss in decoding.
#[test]
fn given_running_receiver_when_command_written_then_receiver_observes_it() {
    // GIVEN
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("commands.bin");
    let downstream = Arc::new(RecordingReceiver::default());
    let receiver =
        FileEncryptedCommandReceiver::new(&path, &test_key(), downstream.clone()).unwrap();
    receiver.start().unwrap();
    let writer = FileEncryptedCommandWriter::new(&path, &test_key()).unwrap();

    // WHEN
    let command = ControlCommandBuilder::default()
        .with_command_id("cmd-1")
        .with_type(ControlCommandType::Navigate)
        .with_payload_entry("url", "https://example.com")
        .build()
        .unwrap();
    writer.send(&command).unwrap();

    // THEN
    let received = downstream.wait_for(1, POLL_INTERVAL * 10);
    receiver.stop();

    assert_eq!(received.len(), 1);
    assert_eq!(received[0].command_id(), "cmd-1");
    assert_eq!(received[0].command_type(), ControlCommandType::Navigate);
    assert_eq!(received[0].payload(), command.payload());
}

/// **VALUE**: Verifies a corrupt file version is skipped once and the next good version works.
///
/// **WHY THIS MATTERS**: A half-written or tampered file must not crash the poller or be
/// retried in a tight loop.
///
/// **BUG THIS CATCHES**: Would catch the poller dying on a decrypt error, or re-reading the same
/// bad bytes on every tick.
#[test]
fn given_corrupt_file_when_polled_then_skipped_and_next_valid_command_delivered() {
    // GIVEN
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("commands.bin");
    let downstream = Arc::new(RecordingReceiver::default());
    let receiver =
        FileEncryptedCommandReceiver::new(&path, &test_key(), downstream.clone()).unwrap();
    receiver.start().unwrap();

    // WHEN: Garbage first
    std::fs::write(&path, vec![0u8; 64]).unwrap();
    std::thread::sleep(POLL_INTERVAL * 3);

    // THEN: Nothing delivered, poller still alive
    assert!(downstream.commands().is_empty());
    assert!(receiver.is_running());

    // WHEN: A valid command replaces it
    let writer = FileEncryptedCommandWriter::new(&path, &test_key()).unwrap();
    let shutdown = ControlCommandBuilder::default()
        .with_command_id("s-1")
        .with_type(ControlCommandType::Shutdown)
        .build()
        .unwrap();
    writer.send(&shutdown).unwrap();
    bump_mtime(&path, 5);

    // THEN
    let received = downstream.wait_for(1, WAIT);
    receiver.stop();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].command_id(), "s-1");
}

/// **VALUE**: Verifies the file channel feeds the dispatcher and shutdown happens once.
///
/// **WHY THIS MATTERS**: In file mode the poller thread calls the dispatcher directly.
///
/// **BUG THIS CATCHES**: Would catch two file versions each forwarding a shutdown.
#[test]
fn given_dispatcher_downstream_when_two_shutdowns_written_then_sink_requested_once() {
    // GIVEN
    struct NoBrowser;
    impl BrowserControl for NoBrowser {
        fn load_url(&self, _url: &str) -> Result<(), DispatchError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingSink {
        calls: AtomicUsize,
    }
    impl ShutdownSink for CountingSink {
        fn request_shutdown(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
        fn is_shutdown_requested(&self) -> bool {
            self.calls.load(Ordering::SeqCst) > 0
        }
    }

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("commands.bin");
    let sink = Arc::new(CountingSink::default());
    let dispatcher = Arc::new(ControlCommandDispatcher::new(
        Arc::new(NoBrowser),
        sink.clone(),
    ));
    let receiver = FileEncryptedCommandReceiver::new(&path, &test_key(), dispatcher).unwrap();
    let writer = FileEncryptedCommandWriter::new(&path, &test_key()).unwrap();
    receiver.start().unwrap();

    // WHEN
    for (i, id) in ["s-1", "s-2"].into_iter().enumerate() {
        let command = ControlCommandBuilder::default()
            .with_command_id(id)
            .with_type(ControlCommandType::Shutdown)
            .build()
            .unwrap();
        writer.send(&command).unwrap();
        bump_mtime(&path, 10 * (i as u64 + 1));
        std::thread::sleep(POLL_INTERVAL * 3);
    }
    receiver.stop();

    // THEN
    assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
}

/// **VALUE**: Verifies start and stop are idempotent and stop joins the poller.
///
/// **WHY THIS MATTERS**: Host teardown may call stop from several paths.
///
/// **BUG THIS CATCHES**: Would catch a second start spawning a second poller, or stop
/// returning before the thread exits.
#[test]
fn given_receiver_when_started_and_stopped_twice_then_state_is_consistent() {
    let dir = TempDir::new().unwrap();
    let receiver = FileEncryptedCommandReceiver::new(
        dir.path().join("absent.bin"),
        &test_key(),
        Arc::new(RecordingReceiver::default()),
    )
    .unwrap();

    receiver.start().unwrap();
    receiver.start().unwrap();
    assert!(receiver.is_running());

    receiver.stop();
    receiver.stop();
    assert!(!receiver.is_running());
}

#[test]
fn given_bad_key_when_constructing_receiver_then_invalid_key() {
    let result = FileEncryptedCommandReceiver::new(
        "/tmp/never-read.bin",
        &BASE64.encode([1u8; 16]),
        Arc::new(RecordingReceiver::default()),
    );

    assert!(matches!(result, Err(FileChannelError::InvalidKey { .. })));
}

#[test]
fn given_shut_down_writer_when_send_then_closed_error() {
    let dir = TempDir::new().unwrap();
    let writer = FileEncryptedCommandWriter::new(dir.path().join("c.bin"), &test_key()).unwrap();
    let command = ControlCommandBuilder::default()
        .with_command_id("x")
        .with_type(ControlCommandType::Start)
        .build()
        .unwrap();

    writer.shutdown();

    assert!(matches!(
        writer.send(&command),
        Err(FileChannelError::Closed { .. })
    ));
    assert!(!writer.path().exists());
}
