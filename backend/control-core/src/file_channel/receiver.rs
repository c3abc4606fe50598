//! Polling receiver for the encrypted command file.

use crate::dispatcher::ControlCommandReceiver;
use crate::error::file_channel::FileChannelError;
use crate::file_channel::crypto::ChannelCipher;
use crate::file_channel::envelope::decode_envelope;

use models::ControlCommand;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};

use log::{debug, error, info, trace, warn};
use zeroize::Zeroizing;

pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

struct Poller {
    path: PathBuf,
    cipher: ChannelCipher,
    downstream: Arc<dyn ControlCommandReceiver>,
}

struct Worker {
    stop_tx: mpsc::Sender<()>,
    thread: JoinHandle<()>,
}

/// Watches one file as an authenticated-encrypted command mailbox.
///
/// Every 100 ms the poller compares the file's modification time with the last
/// one seen. On change it reads, decrypts and decodes the file and hands the
/// command to the downstream receiver on the polling thread. A bad file
/// version is logged and skipped; it is only read again if its mtime changes.
pub struct FileEncryptedCommandReceiver {
    poller: Arc<Poller>,
    worker: Mutex<Option<Worker>>,
}

impl FileEncryptedCommandReceiver {
    /// # Errors
    ///
    /// Returns [`FileChannelError::InvalidKey`] unless `base64_key` decodes to
    /// exactly 32 bytes.
    pub fn new(
        path: impl Into<PathBuf>,
        base64_key: &str,
        downstream: Arc<dyn ControlCommandReceiver>,
    ) -> Result<Self, FileChannelError> {
        let cipher = ChannelCipher::from_base64(base64_key)?;
        let path = path.into();
        info!("Encrypted command receiver watching {}", path.display());

        Ok(Self {
            poller: Arc::new(Poller {
                path,
                cipher,
                downstream,
            }),
            worker: Mutex::new(None),
        })
    }

    pub fn path(&self) -> &Path {
        &self.poller.path
    }

    pub fn is_running(&self) -> bool {
        self.lock_worker().is_some()
    }

    /// Spawn the polling thread. A no-op when already running.
    pub fn start(&self) -> Result<(), FileChannelError> {
        let mut worker = self.lock_worker();
        if worker.is_some() {
            warn!("Encrypted command receiver already running");
            return Ok(());
        }

        let (stop_tx, stop_rx) = mpsc::channel();
        let poller = Arc::clone(&self.poller);
        let thread = thread::Builder::new()
            .name("control-file-poller".to_string())
            .spawn(move || poller.run(stop_rx))?;

        *worker = Some(Worker { stop_tx, thread });
        info!("Encrypted command receiver started");
        Ok(())
    }

    /// Signal the polling thread and wait for it to exit. A no-op when stopped.
    pub fn stop(&self) {
        let Some(worker) = self.lock_worker().take() else {
            return;
        };

        let _ = worker.stop_tx.send(());
        if worker.thread.join().is_err() {
            error!("Encrypted command poller thread panicked");
        }
        info!("Encrypted command receiver stopped");
    }

    fn lock_worker(&self) -> MutexGuard<'_, Option<Worker>> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for FileEncryptedCommandReceiver {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Poller {
    fn run(&self, stop_rx: mpsc::Receiver<()>) {
        let mut last_modified: Option<SystemTime> = None;

        loop {
            self.poll_once(&mut last_modified);

            match stop_rx.recv_timeout(POLL_INTERVAL) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        debug!("Poller for {} exiting", self.path.display());
    }

    fn poll_once(&self, last_modified: &mut Option<SystemTime>) {
        let modified = match std::fs::metadata(&self.path).and_then(|meta| meta.modified()) {
            Ok(modified) => modified,
            Err(e) if e.kind() == ErrorKind::NotFound => return,
            Err(e) => {
                trace!("Cannot stat {}: {e}", self.path.display());
                return;
            }
        };

        if *last_modified == Some(modified) {
            return;
        }
        // Recorded before processing so a bad version is not retried.
        *last_modified = Some(modified);

        match self.read_command() {
            Ok(command) => {
                info!(
                    "Received {} command {} from control file",
                    command.command_type(),
                    command.command_id()
                );
                self.downstream.on_command(command);
            }
            Err(e) => warn!("Skipping control file {}: {e}", self.path.display()),
        }
    }

    fn read_command(&self) -> Result<ControlCommand, FileChannelError> {
        let data = std::fs::read(&self.path)?;
        let plaintext = Zeroizing::new(self.cipher.decrypt(&data)?);
        decode_envelope(&plaintext)
    }
}
