//! JSON persistence for cookie jars.
//!
//! The file holds a JSON array with one object per cookie, exactly as the
//! driver reported them.

use super::driver::Cookie;
use crate::error::{Error, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub(crate) fn save(path: &Path, cookies: &[Cookie]) -> Result<()> {
    let json = serde_json::to_string(cookies).map_err(Error::NoCookiesToSave)?;
    write_atomically(path, json.as_bytes()).map_err(Error::CouldNotSaveCookies)
}

pub(crate) fn load(path: &Path) -> Result<Vec<Cookie>> {
    let contents = fs::read_to_string(path).map_err(Error::CouldNotLoadCookies)?;
    serde_json::from_str(&contents).map_err(Error::CookiesNotInExpectedFormat)
}

/// Write to a sibling temp file and rename it over `path`, so readers never
/// see a half-written jar.
fn write_atomically(path: &Path, contents: &[u8]) -> io::Result<()> {
    let temp = temp_sibling(path)?;
    fs::write(&temp, contents)?;
    if let Err(err) = fs::rename(&temp, path) {
        let _ = fs::remove_file(&temp);
        return Err(err);
    }
    Ok(())
}

fn temp_sibling(path: &Path) -> io::Result<PathBuf> {
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} does not name a file", path.display()),
        )
    })?;
    let mut temp_name = std::ffi::OsString::from(".");
    temp_name.push(file_name);
    temp_name.push(".tmp");
    Ok(path.with_file_name(temp_name))
}
