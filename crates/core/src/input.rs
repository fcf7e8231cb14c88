//! Reading the source text document.

use crate::error::{Error, Result};
use std::path::Path;

/// Read the whole source file as UTF-8 text.
///
/// A missing file is reported as [`Error::FileNotFound`] so callers can tell
/// it apart from other read failures.
pub fn read_all_text(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let text = std::fs::read_to_string(path)?;
    log::debug!("Read {} bytes from {}", text.len(), path.display());
    Ok(text)
}
