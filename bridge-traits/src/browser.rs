//! Browser Launcher Abstraction
//!
//! Interactive authorization needs the user's browser; headless hosts and
//! tests provide a launcher that does nothing.

use crate::error::Result;

/// Opens a URL for the user to visit.
pub trait BrowserLauncher: Send + Sync {
    /// Open `url` in the user's browser.
    fn open(&self, url: &str) -> Result<()>;
}

/// Launcher that never opens anything; the URL is still printed by the caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopBrowser;

impl BrowserLauncher for NoopBrowser {
    fn open(&self, _url: &str) -> Result<()> {
        Ok(())
    }
}
