//! Browser automation collaborator.
//!
//! The harvest engine only ever talks to [`Session`] and
//! [`SessionProvider`]; the chromiumoxide-backed implementation lives in
//! [`engine`]. Tests substitute scripted sessions.

pub mod engine;

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub use engine::BrowserHandle;

/// Browser engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserEngineConfig {
    /// Run in headless mode (default: true).
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Proxy server URL (e.g., "socks5://127.0.0.1:1080").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,

    /// Path to a cookies/storage-state file injected into each session
    /// before navigation. This is how an authenticated session is
    /// bootstrapped without an interactive login flow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookies_file: Option<PathBuf>,

    /// Page load timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Additional Chrome arguments.
    #[serde(default)]
    pub chrome_args: Vec<String>,
}

fn default_headless() -> bool {
    true
}

fn default_timeout() -> u64 {
    30
}

impl Default for BrowserEngineConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            proxy: None,
            cookies_file: None,
            timeout: default_timeout(),
            chrome_args: Vec::new(),
        }
    }
}

impl BrowserEngineConfig {
    /// Page load timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

/// Errors surfaced by a browsing session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The navigation did not complete within the bounded wait window.
    #[error("navigation timed out after {timeout:?}: {url}")]
    Timeout { url: String, timeout: Duration },

    /// Anything else the browser reported.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// One browsing context, owned exclusively by one feed task for its
/// lifetime and used strictly serially.
#[async_trait]
pub trait Session: Send {
    /// Navigate to a URL and wait for the page to settle.
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError>;

    /// Evaluate a script in the page, discarding its value.
    async fn evaluate(&mut self, script: &str) -> Result<(), SessionError>;

    /// Current rendered markup of the page.
    async fn rendered_html(&mut self) -> Result<String, SessionError>;

    /// Await at most one network response whose URL matches `pattern`,
    /// for up to `window`. `None` means no matching response was observed
    /// within the window; that is an expected outcome, not an error.
    async fn next_response_matching(
        &mut self,
        pattern: &Regex,
        window: Duration,
    ) -> Result<Option<String>, SessionError>;

    /// Release the session's resources.
    async fn close(&mut self);
}

/// Opens browsing sessions. One session is handed to each feed task.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn open_session(&self) -> Result<Box<dyn Session>, SessionError>;
}
