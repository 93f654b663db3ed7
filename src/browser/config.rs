//! Launch configuration for the browser driver.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Which driver implementation builds the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BrowserKind {
    /// Stock Selenium Chrome driver with extra command-line options
    Chrome {
        #[serde(default)]
        options: Vec<String>,
    },
    /// undetected-chromedriver
    UndetectedChrome,
}

impl Default for BrowserKind {
    fn default() -> Self {
        BrowserKind::Chrome {
            options: Vec::new(),
        }
    }
}

/// Everything needed to construct a browser session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Driver variant
    pub browser: BrowserKind,

    /// Run without a visible window
    pub headless: bool,

    /// Path to the browser executable (None = driver default)
    pub binary_path: Option<PathBuf>,
}

impl BrowserConfig {
    pub fn chrome() -> Self {
        Self::default()
    }

    pub fn undetected_chrome() -> Self {
        Self {
            browser: BrowserKind::UndetectedChrome,
            ..Self::default()
        }
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Append a command-line option for the Chrome variant.
    ///
    /// Ignored by undetected-chromedriver, which takes no extra options.
    pub fn with_option(mut self, option: impl Into<String>) -> Self {
        if let BrowserKind::Chrome { options } = &mut self.browser {
            options.push(option.into());
        }
        self
    }

    pub fn with_binary_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary_path = Some(path.into());
        self
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = BrowserConfig::default();
        assert_eq!(config.browser, BrowserKind::Chrome { options: vec![] });
        assert!(!config.headless);
        assert!(config.binary_path.is_none());
    }

    #[test]
    fn test_config_builder() {
        let config = BrowserConfig::chrome()
            .with_headless(true)
            .with_option("--window-size=1280,800")
            .with_binary_path("/opt/chrome/chrome");

        assert!(config.headless);
        assert_eq!(
            config.browser,
            BrowserKind::Chrome {
                options: vec!["--window-size=1280,800".to_string()]
            }
        );
        assert_eq!(config.binary_path, Some(PathBuf::from("/opt/chrome/chrome")));
    }

    #[test]
    fn test_undetected_ignores_options() {
        let config = BrowserConfig::undetected_chrome().with_option("--mute-audio");
        assert_eq!(config.browser, BrowserKind::UndetectedChrome);
    }

    #[test]
    fn test_from_toml_str() {
        let config = BrowserConfig::from_toml_str(
            r#"
            headless = true
            binary_path = "/usr/bin/chromium"

            [browser]
            kind = "chrome"
            options = ["--disable-gpu"]
            "#,
        )
        .unwrap();

        assert!(config.headless);
        assert_eq!(config.binary_path, Some(PathBuf::from("/usr/bin/chromium")));
        assert_eq!(
            config.browser,
            BrowserKind::Chrome {
                options: vec!["--disable-gpu".to_string()]
            }
        );

        let config = BrowserConfig::from_toml_str("[browser]\nkind = \"undetected_chrome\"\n").unwrap();
        assert_eq!(config.browser, BrowserKind::UndetectedChrome);
        assert!(!config.headless);
    }

    #[test]
    fn test_from_toml_str_rejects_unknown_kind() {
        let err = BrowserConfig::from_toml_str("[browser]\nkind = \"firefox\"\n").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "headless = true").unwrap();

        let config = BrowserConfig::from_path(file.path()).unwrap();
        assert!(config.headless);

        let err = BrowserConfig::from_path("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
    }
}
