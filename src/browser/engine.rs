//! Chromiumoxide-backed browser sessions.
//!
//! Launches (or reuses) one Chrome process per cycle and hands out one
//! page per feed task. Pagination discovery relies on observing CDP
//! `Network.responseReceived` events rather than guessing endpoint URLs,
//! so every session enables the Network domain and keeps a persistent
//! event subscription from the moment it opens.

#[cfg(feature = "browser")]
use std::sync::Arc;
#[cfg(feature = "browser")]
use std::time::Duration;

#[cfg(feature = "browser")]
use anyhow::Context;
use anyhow::Result;
#[cfg(feature = "browser")]
use async_trait::async_trait;
#[cfg(feature = "browser")]
use futures::stream::BoxStream;
#[cfg(feature = "browser")]
use futures::StreamExt;
#[cfg(feature = "browser")]
use regex::Regex;
#[cfg(feature = "browser")]
use tokio::sync::Mutex;
#[cfg(feature = "browser")]
use tracing::{debug, info, warn};

#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::network::{
    CookieParam, EnableParams, EventResponseReceived, SetUserAgentOverrideParams,
};
#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
#[cfg(feature = "browser")]
use chromiumoxide::{Browser, BrowserConfig, Page};

use super::BrowserEngineConfig;
#[cfg(feature = "browser")]
use super::{Session, SessionError, SessionProvider};

/// Realistic user agent sent with every session.
#[cfg(feature = "browser")]
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Browser handle owning one Chrome process for the duration of a cycle.
#[cfg(feature = "browser")]
pub struct BrowserHandle {
    config: BrowserEngineConfig,
    browser: Arc<Mutex<Browser>>,
}

#[cfg(feature = "browser")]
impl BrowserHandle {
    /// Common Chrome executable paths to check.
    const CHROME_PATHS: &'static [&'static str] = &[
        // Linux
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        // macOS
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        // Common install locations
        "/opt/google/chrome/google-chrome",
    ];

    /// Find a Chrome executable.
    fn find_chrome() -> Result<std::path::PathBuf> {
        for path in Self::CHROME_PATHS {
            let p = std::path::Path::new(path);
            if p.exists() {
                info!("Found Chrome at: {}", path);
                return Ok(p.to_path_buf());
            }
        }

        for cmd in &[
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
        ] {
            if let Ok(output) = std::process::Command::new("which").arg(cmd).output() {
                if output.status.success() {
                    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                    if !path.is_empty() {
                        info!("Found Chrome in PATH: {}", path);
                        return Ok(std::path::PathBuf::from(path));
                    }
                }
            }
        }

        Err(anyhow::anyhow!(
            "Chrome/Chromium not found. Please install it:\n\
             - Arch/Manjaro: sudo pacman -S chromium\n\
             - Ubuntu/Debian: sudo apt install chromium-browser\n\
             - Fedora: sudo dnf install chromium\n\
             - Or download from: https://www.google.com/chrome/"
        ))
    }

    /// Launch a browser process.
    pub async fn launch(config: BrowserEngineConfig) -> Result<Self> {
        info!("Launching browser (headless={})", config.headless);

        let chrome_path = Self::find_chrome()?;

        let mut builder = BrowserConfig::builder().chrome_executable(chrome_path);

        // with_head means NOT headless, confusingly
        if !config.headless {
            builder = builder.with_head();
        }

        if let Some(ref proxy) = config.proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }

        builder = builder
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--no-sandbox") // Often needed for headless in containers
            .arg("--disable-gpu");

        for arg in &config.chrome_args {
            builder = builder.arg(arg);
        }

        let browser_config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build browser config: {}", e))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .context("Failed to launch browser")?;

        // Drive the CDP connection until it closes
        tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            config,
            browser: Arc::new(Mutex::new(browser)),
        })
    }

    /// Close the browser process.
    pub async fn close(&self) {
        let mut browser = self.browser.lock().await;
        if let Err(e) = browser.close().await {
            debug!("Browser close: {}", e);
        }
    }

    /// Load cookies from a JSON file into a page.
    ///
    /// Accepts either a flat cookie array or a storage-state object with a
    /// `cookies` key.
    async fn load_cookies(page: &Page, path: &std::path::Path) -> Result<()> {
        debug!("Loading cookies from {:?}", path);

        let content = std::fs::read_to_string(path)?;
        let parsed: serde_json::Value = serde_json::from_str(&content)?;
        let cookies = parsed
            .get("cookies")
            .and_then(|v| v.as_array())
            .cloned()
            .or_else(|| parsed.as_array().cloned())
            .unwrap_or_default();

        for cookie in cookies {
            let name = cookie
                .get("name")
                .or_else(|| cookie.get("key"))
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            let value = cookie
                .get("value")
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            let domain = cookie
                .get("domain")
                .and_then(|v| v.as_str())
                .unwrap_or_default();

            if name.is_empty() || domain.is_empty() {
                continue;
            }

            let cookie_param = CookieParam::builder()
                .name(name)
                .value(value)
                .domain(domain)
                .build();

            match cookie_param {
                Ok(param) => {
                    if let Err(e) = page.set_cookie(param).await {
                        warn!("Failed to set cookie {}: {}", name, e);
                    }
                }
                Err(e) => {
                    warn!("Failed to build cookie {}: {}", name, e);
                }
            }
        }

        Ok(())
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl SessionProvider for BrowserHandle {
    async fn open_session(&self) -> Result<Box<dyn Session>, SessionError> {
        let browser = self.browser.lock().await;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| SessionError::Other(e.into()))?;

        page.execute(SetUserAgentOverrideParams::new(USER_AGENT.to_string()))
            .await
            .map_err(|e| SessionError::Other(e.into()))?;

        // Enable the Network domain so responseReceived events flow
        page.execute(EnableParams::default())
            .await
            .map_err(|e| SessionError::Other(e.into()))?;

        if let Some(ref cookies_file) = self.config.cookies_file {
            if cookies_file.exists() {
                Self::load_cookies(&page, cookies_file)
                    .await
                    .map_err(SessionError::Other)?;
            }
        }

        // Subscribe before any navigation so no pagination event is missed
        let responses = page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(|e| SessionError::Other(e.into()))?
            .boxed();

        Ok(Box::new(CdpSession {
            page,
            responses,
            timeout: self.config.timeout(),
        }))
    }
}

/// One CDP page plus its network-response subscription.
#[cfg(feature = "browser")]
pub struct CdpSession {
    page: Page,
    responses: BoxStream<'static, Arc<EventResponseReceived>>,
    timeout: Duration,
}

#[cfg(feature = "browser")]
impl CdpSession {
    /// Wait for the document to report a usable ready state, best effort.
    async fn wait_for_ready(&mut self) {
        let script = r#"
            new Promise((resolve) => {
                if (document.readyState === 'complete' || document.readyState === 'interactive') {
                    resolve(document.readyState);
                } else {
                    document.addEventListener('DOMContentLoaded', () => resolve(document.readyState));
                    setTimeout(() => resolve('timeout'), 10000);
                }
            })
        "#;

        match tokio::time::timeout(self.timeout, self.page.evaluate(script.to_string())).await {
            Ok(Ok(result)) => {
                let state: String = result
                    .into_value()
                    .unwrap_or_else(|_| "unknown".to_string());
                debug!("Page ready state: {}", state);
            }
            Ok(Err(e)) => {
                debug!("Could not check ready state: {}", e);
            }
            Err(_) => {
                warn!("Timeout waiting for page ready state");
            }
        }

        // Small additional delay for late-loading scripts
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl Session for CdpSession {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        debug!("Navigating to {}", url);

        let nav_params = NavigateParams::builder()
            .url(url)
            .build()
            .map_err(|e| SessionError::Other(anyhow::anyhow!("Invalid URL: {}", e)))?;

        match tokio::time::timeout(self.timeout, self.page.execute(nav_params)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(SessionError::Other(e.into())),
            Err(_) => {
                return Err(SessionError::Timeout {
                    url: url.to_string(),
                    timeout: self.timeout,
                })
            }
        }

        self.wait_for_ready().await;
        Ok(())
    }

    async fn evaluate(&mut self, script: &str) -> Result<(), SessionError> {
        self.page
            .evaluate(script.to_string())
            .await
            .map(|_| ())
            .map_err(|e| SessionError::Other(e.into()))
    }

    async fn rendered_html(&mut self) -> Result<String, SessionError> {
        self.page
            .content()
            .await
            .map_err(|e| SessionError::Other(e.into()))
    }

    async fn next_response_matching(
        &mut self,
        pattern: &Regex,
        window: Duration,
    ) -> Result<Option<String>, SessionError> {
        let deadline = tokio::time::Instant::now() + window;

        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }

            match tokio::time::timeout(remaining, self.responses.next()).await {
                // Window elapsed without a matching response
                Err(_) => return Ok(None),
                // Event stream closed (page is gone)
                Ok(None) => return Ok(None),
                Ok(Some(event)) => {
                    let url = event.response.url.clone();
                    if pattern.is_match(&url) {
                        debug!("Observed pagination response: {}", url);
                        return Ok(Some(url));
                    }
                }
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.page.clone().close().await {
            debug!("Page close: {}", e);
        }
    }
}

// Stub for when the browser feature is disabled
#[cfg(not(feature = "browser"))]
pub struct BrowserHandle {
    #[allow(dead_code)]
    config: BrowserEngineConfig,
}

#[cfg(not(feature = "browser"))]
impl BrowserHandle {
    pub async fn launch(_config: BrowserEngineConfig) -> Result<Self> {
        Err(anyhow::anyhow!(
            "Browser support not compiled. Rebuild with: cargo build --features browser"
        ))
    }

    pub async fn close(&self) {}
}

#[cfg(not(feature = "browser"))]
#[async_trait::async_trait]
impl super::SessionProvider for BrowserHandle {
    async fn open_session(&self) -> Result<Box<dyn super::Session>, super::SessionError> {
        Err(super::SessionError::Other(anyhow::anyhow!(
            "browser support not compiled"
        )))
    }
}
