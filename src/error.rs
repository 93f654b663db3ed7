//! Errors surfaced by the browser facade.

use crate::executor::ExecutorError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error("Driver call failed: {0}")]
    Driver(String),

    #[error("Driver did not expose `{attribute}`")]
    InvalidCall { attribute: String },

    #[error("Missing dependency `{module}`: {reason}")]
    MissingDependency { module: String, reason: String },

    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Browser has been closed")]
    HandleClosed,

    #[error("No cookies to save: {0}")]
    NoCookiesToSave(#[source] serde_json::Error),

    #[error("Could not save cookies: {0}")]
    CouldNotSaveCookies(#[source] io::Error),

    #[error("Cookies are not in the expected format: {0}")]
    CookiesNotInExpectedFormat(#[source] serde_json::Error),

    #[error("Could not load cookies: {0}")]
    CouldNotLoadCookies(#[source] io::Error),

    #[error("Could not read config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

#[cfg(feature = "python")]
impl From<pyo3::PyErr> for Error {
    fn from(err: pyo3::PyErr) -> Self {
        Error::Driver(err.to_string())
    }
}
