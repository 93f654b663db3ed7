//! Browser automation facade.
//!
//! [`AutomatedBrowser`] owns a driver that lives in a single-threaded foreign
//! runtime. Each public method is exactly one operation submitted through a
//! [`Serializer`], so the driver is only ever touched from the executor's owner
//! thread no matter which thread calls the method.

pub mod config;
mod cookies;
pub mod driver;
#[cfg(feature = "python")]
pub mod python;

pub use config::{BrowserConfig, BrowserKind};
pub use driver::{BrowserDriver, Cookie, DriverLauncher, ScrollOffset};

use crate::error::{Error, Result};
use crate::executor::{Executor, Serializer};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;

/// A live browser session reachable from any thread.
///
/// Once [`quit`](AutomatedBrowser::quit) has run, every other method fails
/// with [`Error::HandleClosed`]. Dropping a session that was never quit quits
/// it on the owner thread, blocking until the owner thread gets to it.
pub struct AutomatedBrowser<D: BrowserDriver> {
    executor: Serializer,
    // Only locked on the owner thread, so the lock is never contended.
    driver: Arc<Mutex<Option<D>>>,
}

impl<D: BrowserDriver> AutomatedBrowser<D> {
    /// Build a driver on the owner thread.
    pub fn launch<L>(executor: Serializer, config: BrowserConfig, launcher: L) -> Result<Self>
    where
        L: DriverLauncher<Driver = D>,
    {
        #[cfg(target_os = "macos")]
        tracing::warn!(
            "Chrome on macOS leaves a code-sign clone of itself behind on every launch \
             (https://issues.chromium.org/issues/379125944); clean them up periodically with: \
             find /private/var/folders -name \"com.google.Chrome.code_sign_clone\" -exec rm -r -- {{}} + 2>/dev/null"
        );

        let headless = config.headless;
        let driver = executor.execute(move || launcher.launch(&config))?;
        tracing::info!(headless, "browser launched");
        Ok(Self {
            executor,
            driver: Arc::new(Mutex::new(Some(driver))),
        })
    }

    /// Launch on the process-wide owner thread.
    pub fn launch_shared<L>(config: BrowserConfig, launcher: L) -> Result<Self>
    where
        L: DriverLauncher<Driver = D>,
    {
        Self::launch(Serializer::shared()?, config, launcher)
    }

    pub fn executor(&self) -> &Serializer {
        &self.executor
    }

    pub fn is_closed(&self) -> Result<bool> {
        let driver = Arc::clone(&self.driver);
        self.executor
            .execute(move || Ok::<_, Error>(driver.lock().is_none()))
    }

    fn with_driver<T, F>(&self, call: F) -> Result<T>
    where
        F: FnOnce(&mut D) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let driver = Arc::clone(&self.driver);
        self.executor.execute(move || {
            let mut slot = driver.lock();
            let driver = slot.as_mut().ok_or(Error::HandleClosed)?;
            call(driver)
        })
    }

    /// End the session. Calling it again is a no-op.
    pub fn quit(&self) -> Result<()> {
        let driver = Arc::clone(&self.driver);
        self.executor.execute(move || {
            let Some(mut live) = driver.lock().take() else {
                return Ok(());
            };
            live.quit()?;
            tracing::info!("browser quit");
            Ok(())
        })
    }

    pub fn page_source(&self) -> Result<Option<String>> {
        self.with_driver(|driver| driver.page_source())
    }

    pub fn current_url(&self) -> Result<Option<String>> {
        self.with_driver(|driver| driver.current_url())
    }

    pub fn load(&self, url: impl Into<String>) -> Result<()> {
        let url = url.into();
        tracing::debug!(url = %url, "loading page");
        self.with_driver(move |driver| driver.get(&url))
    }

    pub fn forward(&self) -> Result<()> {
        self.with_driver(|driver| driver.forward())
    }

    pub fn back(&self) -> Result<()> {
        self.with_driver(|driver| driver.back())
    }

    pub fn refresh(&self) -> Result<()> {
        self.with_driver(|driver| driver.refresh())
    }

    pub fn scroll_by(&self, offset: ScrollOffset) -> Result<()> {
        self.with_driver(move |driver| driver.scroll_by(offset))
    }

    /// Write every cookie of the session to `path` as a JSON array.
    pub fn save_cookies(&self, path: impl AsRef<Path>) -> Result<()> {
        let jar = self.with_driver(|driver| driver.cookies())?;
        cookies::save(path.as_ref(), &jar)?;
        tracing::debug!(count = jar.len(), path = %path.as_ref().display(), "cookies saved");
        Ok(())
    }

    /// Add every cookie stored at `path` to the session.
    pub fn load_cookies(&self, path: impl AsRef<Path>) -> Result<()> {
        let jar = cookies::load(path.as_ref())?;
        let count = jar.len();
        self.with_driver(move |driver| {
            jar.into_iter()
                .try_for_each(|cookie| driver.add_cookie(cookie))
        })?;
        tracing::debug!(count, path = %path.as_ref().display(), "cookies loaded");
        Ok(())
    }

    pub fn delete_all_cookies(&self) -> Result<()> {
        self.with_driver(|driver| driver.delete_all_cookies())
    }
}

impl<D: BrowserDriver> Drop for AutomatedBrowser<D> {
    fn drop(&mut self) {
        // The driver must be released on the owner thread, not the dropping one.
        let driver = Arc::clone(&self.driver);
        let released = self.executor.execute(move || {
            let Some(mut live) = driver.lock().take() else {
                return Ok(());
            };
            if let Err(err) = live.quit() {
                tracing::warn!(error = %err, "browser quit on drop failed");
            }
            drop(live);
            tracing::debug!("browser released on drop");
            Ok::<_, Error>(())
        });
        if let Err(err) = released {
            tracing::warn!(error = %err, "could not release browser on its owner thread");
        }
    }
}
