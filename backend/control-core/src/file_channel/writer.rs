//! Controller-side writer for the encrypted command file.

use crate::error::file_channel::FileChannelError;
use crate::file_channel::crypto::ChannelCipher;
use crate::file_channel::envelope::encode_envelope;

use common::ErrorLocation;
use models::ControlCommand;

use std::ffi::OsString;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info};
use zeroize::Zeroizing;

const TEMP_SUFFIX: &str = ".tmp";

/// Writes one command at a time to the watched file.
///
/// Each write encrypts under a fresh nonce, goes to a sibling temp file and is
/// renamed into place, so the poller never sees a partial file.
#[derive(Debug)]
pub struct FileEncryptedCommandWriter {
    path: PathBuf,
    cipher: ChannelCipher,
    closed: AtomicBool,
}

impl FileEncryptedCommandWriter {
    pub fn new(path: impl Into<PathBuf>, base64_key: &str) -> Result<Self, FileChannelError> {
        Ok(Self {
            path: path.into(),
            cipher: ChannelCipher::from_base64(base64_key)?,
            closed: AtomicBool::new(false),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// # Errors
    ///
    /// Returns [`FileChannelError::Closed`] after [`shutdown`](Self::shutdown),
    /// or an IO/encryption error.
    pub fn send(&self, command: &ControlCommand) -> Result<(), FileChannelError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(FileChannelError::Closed {
                message: "Channel is shut down".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let plaintext = Zeroizing::new(encode_envelope(command)?);
        let encrypted = self.cipher.encrypt(&plaintext)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let temp_path = self.temp_path();
        std::fs::write(&temp_path, &encrypted)?;
        std::fs::rename(&temp_path, &self.path)?;

        debug!(
            "Wrote {} command {} ({} bytes)",
            command.command_type(),
            command.command_id(),
            encrypted.len()
        );
        Ok(())
    }

    /// Reject further sends. Idempotent.
    pub fn shutdown(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!("Encrypted command writer for {} shut down", self.path.display());
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_default();
        name.push(TEMP_SUFFIX);
        self.path.with_file_name(name)
    }
}
