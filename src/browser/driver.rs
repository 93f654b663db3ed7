//! Capability interface over the foreign browser handle.
//!
//! Implementations are not expected to be thread-safe in any sense beyond
//! `Send`: [`AutomatedBrowser`](super::AutomatedBrowser) only ever calls them
//! from the executor's owner thread, one call at a time.

use super::config::BrowserConfig;
use crate::error::Result;
use indexmap::IndexMap;

/// A cookie as the driver reports it: field name to JSON value, in the order
/// the driver listed them.
pub type Cookie = IndexMap<String, serde_json::Value>;

/// Amount to scroll the viewport by, in CSS pixels.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScrollOffset {
    pub dx: i64,
    pub dy: i64,
}

impl ScrollOffset {
    pub fn new(dx: i64, dy: i64) -> Self {
        Self { dx, dy }
    }
}

/// Operations a live browser session supports.
pub trait BrowserDriver: Send + 'static {
    /// URL of the current page, if the driver reports one.
    fn current_url(&mut self) -> Result<Option<String>>;

    /// Raw source of the current page, if the driver reports one.
    fn page_source(&mut self) -> Result<Option<String>>;

    fn get(&mut self, url: &str) -> Result<()>;

    fn back(&mut self) -> Result<()>;

    fn forward(&mut self) -> Result<()>;

    fn refresh(&mut self) -> Result<()>;

    fn scroll_by(&mut self, offset: ScrollOffset) -> Result<()>;

    fn cookies(&mut self) -> Result<Vec<Cookie>>;

    fn add_cookie(&mut self, cookie: Cookie) -> Result<()>;

    fn delete_all_cookies(&mut self) -> Result<()>;

    /// End the session. The driver is dropped afterwards.
    fn quit(&mut self) -> Result<()>;
}

/// Builds a driver from a [`BrowserConfig`]. Runs on the owner thread.
pub trait DriverLauncher: Send + 'static {
    type Driver: BrowserDriver;

    fn launch(&self, config: &BrowserConfig) -> Result<Self::Driver>;
}
