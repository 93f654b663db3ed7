//! Selenium driver hosted in an embedded Python interpreter.
//!
//! The Python objects here are not safe to use from more than one thread, even
//! with the GIL held; Selenium keeps per-session state that assumes a single
//! caller. [`AutomatedBrowser`](super::AutomatedBrowser) guarantees every call
//! lands on its executor's owner thread.

use super::config::{BrowserConfig, BrowserKind};
use super::driver::{BrowserDriver, Cookie, DriverLauncher, ScrollOffset};
use crate::error::{Error, Result};
use pyo3::prelude::*;
use pyo3::sync::PyOnceLock;
use pyo3::types::{PyDict, PyModule};

/// Python modules the driver needs, imported on first use.
///
/// The cells are initialised while attached to the interpreter, so they must
/// be interpreter-aware to avoid deadlocking against its lock.
struct PythonDependencies {
    sys: PyOnceLock<Py<PyModule>>,
    json: PyOnceLock<Py<PyModule>>,
    undetected_chromedriver: PyOnceLock<Py<PyModule>>,
    webdriver: PyOnceLock<Py<PyModule>>,
}

static DEPENDENCIES: PythonDependencies = PythonDependencies {
    sys: PyOnceLock::new(),
    json: PyOnceLock::new(),
    undetected_chromedriver: PyOnceLock::new(),
    webdriver: PyOnceLock::new(),
};

impl PythonDependencies {
    fn sys<'py>(&self, py: Python<'py>) -> Result<Bound<'py, PyModule>> {
        Self::load(&self.sys, py, "sys")
    }

    fn json<'py>(&self, py: Python<'py>) -> Result<Bound<'py, PyModule>> {
        Self::load(&self.json, py, "json")
    }

    fn undetected_chromedriver<'py>(&self, py: Python<'py>) -> Result<Bound<'py, PyModule>> {
        Self::load(&self.undetected_chromedriver, py, "undetected_chromedriver")
    }

    fn webdriver<'py>(&self, py: Python<'py>) -> Result<Bound<'py, PyModule>> {
        Self::load(&self.webdriver, py, "selenium.webdriver")
    }

    fn load<'py>(
        slot: &PyOnceLock<Py<PyModule>>,
        py: Python<'py>,
        name: &str,
    ) -> Result<Bound<'py, PyModule>> {
        let module = slot.get_or_try_init(py, || {
            py.import(name)
                .map(Bound::unbind)
                .map_err(|err| Error::MissingDependency {
                    module: name.to_string(),
                    reason: err.to_string(),
                })
        })?;
        Ok(module.bind(py).clone())
    }
}

/// Launches Chrome through Selenium or undetected-chromedriver.
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonLauncher;

impl DriverLauncher for PythonLauncher {
    type Driver = PythonDriver;

    fn launch(&self, config: &BrowserConfig) -> Result<PythonDriver> {
        Python::attach(|py| {
            let version = DEPENDENCIES.sys(py)?.getattr("version_info")?;
            let major: u32 = version.getattr("major")?.extract()?;
            let minor: u32 = version.getattr("minor")?.extract()?;
            tracing::info!(major, minor, "python interpreter ready");

            let driver = match &config.browser {
                BrowserKind::Chrome { options } => {
                    let webdriver = DEPENDENCIES.webdriver(py)?;
                    launch_chrome(py, &webdriver, config, options)
                }
                BrowserKind::UndetectedChrome => {
                    let undetected = DEPENDENCIES.undetected_chromedriver(py)?;
                    launch_undetected(py, &undetected, config)
                }
            }
            .map_err(|err| Error::Launch(err.to_string()))?;

            Ok(PythonDriver {
                driver: driver.unbind(),
            })
        })
    }
}

fn launch_chrome<'py>(
    py: Python<'py>,
    webdriver: &Bound<'py, PyModule>,
    config: &BrowserConfig,
    options: &[String],
) -> PyResult<Bound<'py, PyAny>> {
    let chrome_options = webdriver.getattr("ChromeOptions")?.call0()?;
    if config.headless {
        chrome_options.call_method1("add_argument", ("--headless=new",))?;
    }
    for option in options {
        chrome_options.call_method1("add_argument", (option.as_str(),))?;
    }
    if let Some(path) = &config.binary_path {
        chrome_options.setattr("binary_location", path.to_string_lossy().into_owned())?;
    }

    let kwargs = PyDict::new(py);
    kwargs.set_item("options", chrome_options)?;
    webdriver.getattr("Chrome")?.call((), Some(&kwargs))
}

fn launch_undetected<'py>(
    py: Python<'py>,
    undetected: &Bound<'py, PyModule>,
    config: &BrowserConfig,
) -> PyResult<Bound<'py, PyAny>> {
    let kwargs = PyDict::new(py);
    kwargs.set_item("headless", config.headless)?;
    if let Some(path) = &config.binary_path {
        kwargs.set_item(
            "browser_executable_path",
            path.to_string_lossy().into_owned(),
        )?;
    }
    undetected.getattr("Chrome")?.call((), Some(&kwargs))
}

/// A live `selenium.webdriver` session.
pub struct PythonDriver {
    driver: Py<PyAny>,
}

impl PythonDriver {
    /// Read a string attribute; `None` when Python reports `None`.
    fn string_attribute(&self, name: &str) -> Result<Option<String>> {
        Python::attach(|py| {
            let value = self
                .driver
                .bind(py)
                .getattr(name)
                .map_err(|_| Error::InvalidCall {
                    attribute: name.to_string(),
                })?;
            if value.is_none() {
                return Ok(None);
            }
            Ok(Some(value.extract()?))
        })
    }

    fn call0(&self, method: &str) -> Result<()> {
        Python::attach(|py| {
            self.driver.bind(py).call_method0(method)?;
            Ok(())
        })
    }
}

impl BrowserDriver for PythonDriver {
    fn current_url(&mut self) -> Result<Option<String>> {
        self.string_attribute("current_url")
    }

    fn page_source(&mut self) -> Result<Option<String>> {
        self.string_attribute("page_source")
    }

    fn get(&mut self, url: &str) -> Result<()> {
        Python::attach(|py| {
            self.driver.bind(py).call_method1("get", (url,))?;
            Ok(())
        })
    }

    fn back(&mut self) -> Result<()> {
        self.call0("back")
    }

    fn forward(&mut self) -> Result<()> {
        self.call0("forward")
    }

    fn refresh(&mut self) -> Result<()> {
        self.call0("refresh")
    }

    fn scroll_by(&mut self, offset: ScrollOffset) -> Result<()> {
        Python::attach(|py| {
            let webdriver = DEPENDENCIES.webdriver(py)?;
            webdriver
                .getattr("ActionChains")?
                .call1((self.driver.bind(py),))?
                .call_method1("scroll_by_amount", (offset.dx, offset.dy))?
                .call_method0("perform")?;
            Ok(())
        })
    }

    fn cookies(&mut self) -> Result<Vec<Cookie>> {
        Python::attach(|py| {
            let json = DEPENDENCIES.json(py)?;
            let cookies = self.driver.bind(py).call_method0("get_cookies")?;
            let dumped: String = json.call_method1("dumps", (cookies,))?.extract()?;
            serde_json::from_str(&dumped).map_err(Error::CookiesNotInExpectedFormat)
        })
    }

    fn add_cookie(&mut self, cookie: Cookie) -> Result<()> {
        let encoded = serde_json::to_string(&cookie).map_err(Error::CookiesNotInExpectedFormat)?;
        Python::attach(|py| {
            let json = DEPENDENCIES.json(py)?;
            let cookie = json.call_method1("loads", (encoded,))?;
            self.driver.bind(py).call_method1("add_cookie", (cookie,))?;
            Ok(())
        })
    }

    fn delete_all_cookies(&mut self) -> Result<()> {
        self.call0("delete_all_cookies")
    }

    fn quit(&mut self) -> Result<()> {
        self.call0("quit")
    }
}
