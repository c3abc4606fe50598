//! Browser collaborator used when no embedded browser runtime is attached.

use control_core::dispatcher::BrowserControl;
use control_core::error::dispatch::DispatchError;

use std::sync::{Mutex, PoisonError};

use log::info;
use url::Url;

/// Records navigations instead of rendering them.
///
/// Only `http` and `https` URLs are accepted; anything else is refused the way
/// a real browser frame would refuse to load it.
#[derive(Debug, Default)]
pub struct LoggingBrowser {
    history: Mutex<Vec<String>>,
}

impl LoggingBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every URL loaded so far, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn current_url(&self) -> Option<String> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl BrowserControl for LoggingBrowser {
    fn load_url(&self, url: &str) -> Result<(), DispatchError> {
        let parsed = Url::parse(url)
            .map_err(|e| DispatchError::navigation(format!("Invalid URL '{url}': {e}")))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DispatchError::navigation(format!(
                "Refusing to load '{url}': unsupported scheme {}",
                parsed.scheme()
            )));
        }

        info!("Loading {url}");
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());
        Ok(())
    }
}
