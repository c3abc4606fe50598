//! Per-session authentication tracking.

/// Authentication state of one control session.
///
/// Starts unauthenticated. A successful handshake flips it once and there is
/// no way back.
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    authenticated: bool,
}

impl SessionState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn mark_authenticated(&mut self) {
        self.authenticated = true;
    }

    pub(crate) fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}
