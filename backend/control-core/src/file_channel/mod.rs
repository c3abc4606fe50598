//! Encrypted file command channel.
//!
//! A file on disk acts as a one-way mailbox: the controller replaces it with
//! an AES-256-GCM encrypted JSON envelope and the host polls for changes.

pub mod crypto;
pub mod envelope;
mod receiver;
mod writer;

pub use crypto::ChannelCipher;
pub use envelope::{decode_envelope, encode_envelope};
pub use receiver::{FileEncryptedCommandReceiver, POLL_INTERVAL};
pub use writer::FileEncryptedCommandWriter;
