//! Browser launcher backed by the `webbrowser` crate

use bridge_traits::browser::BrowserLauncher;
use bridge_traits::error::{BridgeError, Result};
use tracing::debug;

/// Opens URLs in the platform's default browser.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn open(&self, url: &str) -> Result<()> {
        debug!("Opening authorization URL in system browser");
        webbrowser::open(url)
            .map_err(|e| BridgeError::NotAvailable(format!("Could not open browser: {}", e)))
    }
}
