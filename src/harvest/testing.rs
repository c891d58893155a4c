//! Scripted session doubles for harvest tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;

use crate::browser::{Session, SessionError, SessionProvider};

/// A [`Session`] whose pages and pagination events are scripted up front.
///
/// Navigations are recorded into a list shared across clones, so a
/// provider handing out cloned sessions still yields one combined record.
#[derive(Clone, Default)]
pub(crate) struct ScriptedSession {
    pages: HashMap<String, String>,
    events: Arc<Mutex<VecDeque<Option<String>>>>,
    timeout_urls: HashSet<String>,
    broken_urls: HashSet<String>,
    navigations: Arc<Mutex<Vec<String>>>,
    current: Option<String>,
}

impl ScriptedSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the markup rendered after navigating to `url`.
    pub fn add_page(&mut self, url: &str, html: &str) {
        self.pages.insert(url.to_string(), html.to_string());
    }

    /// Queue the next pagination event; `None` scripts a silent window.
    pub fn push_event(&mut self, url: Option<&str>) {
        self.events
            .lock()
            .unwrap()
            .push_back(url.map(|u| u.to_string()));
    }

    /// Make navigation to `url` time out.
    pub fn fail_navigation(&mut self, url: &str) {
        self.timeout_urls.insert(url.to_string());
    }

    /// Make navigation to `url` fail hard (a non-timeout session error).
    pub fn break_navigation(&mut self, url: &str) {
        self.broken_urls.insert(url.to_string());
    }

    /// Every URL navigated to, in order, across all clones.
    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }
}

#[async_trait]
impl Session for ScriptedSession {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        self.navigations.lock().unwrap().push(url.to_string());
        if self.broken_urls.contains(url) {
            return Err(SessionError::Other(anyhow::anyhow!(
                "scripted navigation failure: {url}"
            )));
        }
        if self.timeout_urls.contains(url) {
            return Err(SessionError::Timeout {
                url: url.to_string(),
                timeout: Duration::ZERO,
            });
        }
        self.current = Some(url.to_string());
        Ok(())
    }

    async fn evaluate(&mut self, _script: &str) -> Result<(), SessionError> {
        Ok(())
    }

    async fn rendered_html(&mut self) -> Result<String, SessionError> {
        let html = self
            .current
            .as_ref()
            .and_then(|url| self.pages.get(url))
            .cloned()
            .unwrap_or_else(|| "<html><body></body></html>".to_string());
        Ok(html)
    }

    async fn next_response_matching(
        &mut self,
        pattern: &Regex,
        _window: Duration,
    ) -> Result<Option<String>, SessionError> {
        let next = self.events.lock().unwrap().pop_front().flatten();
        Ok(next.filter(|url| pattern.is_match(url)))
    }

    async fn close(&mut self) {}
}

/// A [`SessionProvider`] handing out clones of one scripted session.
pub(crate) struct ScriptedProvider {
    template: ScriptedSession,
    fail_open: bool,
}

impl ScriptedProvider {
    pub fn new(template: ScriptedSession) -> Self {
        Self {
            template,
            fail_open: false,
        }
    }

    /// Make every `open_session` call fail.
    #[allow(dead_code)]
    pub fn failing() -> Self {
        Self {
            template: ScriptedSession::new(),
            fail_open: true,
        }
    }
}

#[async_trait]
impl SessionProvider for ScriptedProvider {
    async fn open_session(&self) -> Result<Box<dyn Session>, SessionError> {
        if self.fail_open {
            return Err(SessionError::Other(anyhow::anyhow!(
                "scripted session open failure"
            )));
        }
        Ok(Box::new(self.template.clone()))
    }
}
