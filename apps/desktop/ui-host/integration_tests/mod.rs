//! Integration tests for the UI host.
//!
//! Each test starts a full host (dispatcher, channel, UI consumer) and drives
//! it as an external controller would.

mod host;
