//! In-memory driver for exercising the facade without a real browser.
//!
//! [`FakeDriver`] keeps a navigation history and a cookie jar, and records
//! every thread that touches it in a shared [`FakeRecorder`] so tests can check
//! the single-owner guarantee from the outside.

use crate::browser::{BrowserConfig, BrowserDriver, Cookie, DriverLauncher, ScrollOffset};
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread::{self, ThreadId};

/// Shared view into everything fake drivers have done.
#[derive(Debug, Default)]
pub struct FakeRecorder {
    state: Mutex<RecordedState>,
}

#[derive(Debug, Default)]
struct RecordedState {
    threads: HashSet<ThreadId>,
    launches: Vec<BrowserConfig>,
    scrolled: (i64, i64),
    quit: bool,
    released_on: Option<ThreadId>,
}

impl FakeRecorder {
    fn touch(&self) {
        self.state.lock().threads.insert(thread::current().id());
    }

    /// Every thread that has called into a driver or the launcher.
    pub fn threads(&self) -> HashSet<ThreadId> {
        self.state.lock().threads.clone()
    }

    /// Configurations the launcher was asked to build, oldest first.
    pub fn launches(&self) -> Vec<BrowserConfig> {
        self.state.lock().launches.clone()
    }

    /// Total scroll applied across all calls.
    pub fn scrolled(&self) -> (i64, i64) {
        self.state.lock().scrolled
    }

    pub fn was_quit(&self) -> bool {
        self.state.lock().quit
    }

    /// The thread that dropped the most recent driver, if any was dropped.
    pub fn released_on(&self) -> Option<ThreadId> {
        self.state.lock().released_on
    }
}

/// Launcher producing [`FakeDriver`]s.
#[derive(Debug, Clone, Default)]
pub struct FakeLauncher {
    recorder: Arc<FakeRecorder>,
    launch_error: Option<String>,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A launcher whose every launch fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            launch_error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn recorder(&self) -> Arc<FakeRecorder> {
        Arc::clone(&self.recorder)
    }
}

impl DriverLauncher for FakeLauncher {
    type Driver = FakeDriver;

    fn launch(&self, config: &BrowserConfig) -> Result<FakeDriver> {
        self.recorder.touch();
        if let Some(message) = &self.launch_error {
            return Err(Error::Launch(message.clone()));
        }
        self.recorder.state.lock().launches.push(config.clone());
        Ok(FakeDriver {
            recorder: Arc::clone(&self.recorder),
            history: Vec::new(),
            position: 0,
            cookies: Vec::new(),
        })
    }
}

/// A browser with a history stack and a cookie jar, and no network.
#[derive(Debug)]
pub struct FakeDriver {
    recorder: Arc<FakeRecorder>,
    history: Vec<String>,
    position: usize,
    cookies: Vec<Cookie>,
}

impl FakeDriver {
    fn current(&self) -> Option<&str> {
        self.history.get(self.position).map(String::as_str)
    }
}

impl BrowserDriver for FakeDriver {
    fn current_url(&mut self) -> Result<Option<String>> {
        self.recorder.touch();
        Ok(self.current().map(str::to_string))
    }

    fn page_source(&mut self) -> Result<Option<String>> {
        self.recorder.touch();
        Ok(self
            .current()
            .map(|url| format!("<html><head><title>{url}</title></head><body></body></html>")))
    }

    fn get(&mut self, url: &str) -> Result<()> {
        self.recorder.touch();
        if !url.contains("://") && !url.starts_with("about:") && !url.starts_with("data:") {
            return Err(Error::Driver(format!("invalid argument: {url}")));
        }
        if !self.history.is_empty() {
            self.history.truncate(self.position + 1);
        }
        self.history.push(url.to_string());
        self.position = self.history.len() - 1;
        Ok(())
    }

    fn back(&mut self) -> Result<()> {
        self.recorder.touch();
        self.position = self.position.saturating_sub(1);
        Ok(())
    }

    fn forward(&mut self) -> Result<()> {
        self.recorder.touch();
        if self.position + 1 < self.history.len() {
            self.position += 1;
        }
        Ok(())
    }

    fn refresh(&mut self) -> Result<()> {
        self.recorder.touch();
        Ok(())
    }

    fn scroll_by(&mut self, offset: ScrollOffset) -> Result<()> {
        self.recorder.touch();
        let mut state = self.recorder.state.lock();
        state.scrolled.0 += offset.dx;
        state.scrolled.1 += offset.dy;
        Ok(())
    }

    fn cookies(&mut self) -> Result<Vec<Cookie>> {
        self.recorder.touch();
        Ok(self.cookies.clone())
    }

    fn add_cookie(&mut self, cookie: Cookie) -> Result<()> {
        self.recorder.touch();
        if !cookie.contains_key("name") || !cookie.contains_key("value") {
            return Err(Error::Driver(
                "invalid cookie: missing 'name' or 'value'".to_string(),
            ));
        }
        self.cookies
            .retain(|existing| existing.get("name") != cookie.get("name"));
        self.cookies.push(cookie);
        Ok(())
    }

    fn delete_all_cookies(&mut self) -> Result<()> {
        self.recorder.touch();
        self.cookies.clear();
        Ok(())
    }

    fn quit(&mut self) -> Result<()> {
        self.recorder.touch();
        self.recorder.state.lock().quit = true;
        Ok(())
    }
}

impl Drop for FakeDriver {
    fn drop(&mut self) {
        self.recorder.state.lock().released_on = Some(thread::current().id());
    }
}
