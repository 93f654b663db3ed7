//! Drive a browser session that lives in a single-threaded foreign runtime
//! from any number of application threads.
//!
//! The [`executor`] module is the core: it guarantees that every operation
//! against the foreign handle runs on one designated thread, one at a time.
//! [`browser`] is a thin client of it that exposes navigation, page reads and
//! cookie persistence.
//!
//! ```
//! use automated_browser::{Error, Executor, Serializer};
//!
//! let executor = Serializer::shared()?;
//! let on_owner = executor.execute(|| Ok::<_, Error>(std::thread::current().id()))?;
//! assert_ne!(on_owner, std::thread::current().id());
//! # Ok::<(), Error>(())
//! ```

pub mod browser;
pub mod error;
pub mod executor;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use browser::{AutomatedBrowser, BrowserConfig, BrowserKind};
pub use error::{Error, Result};
pub use executor::{Executor, ExecutorConfig, ExecutorError, OwnerThread, Serializer};
