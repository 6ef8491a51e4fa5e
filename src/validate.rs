//! Precondition checks run before any tool is started

use crate::error::{Result, WrapperError};
use std::path::{Path, PathBuf};

pub fn require_file(label: &'static str, path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(WrapperError::MissingInput {
            label,
            path: path.to_path_buf(),
        })
    }
}

pub fn require_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(WrapperError::MissingOutputDir(path.to_path_buf()))
    }
}

/// Check the file name ends with one of `extensions` (given with the dot)
pub fn require_extension(path: &Path, extensions: &[&str]) -> Result<()> {
    let name = path.to_string_lossy();
    if extensions.iter().any(|ext| name.ends_with(ext)) {
        Ok(())
    } else {
        Err(WrapperError::InvalidExtension {
            path: path.to_path_buf(),
            expected: extensions.join(", "),
        })
    }
}

pub fn require_present<'a>(name: &'static str, value: Option<&'a PathBuf>) -> Result<&'a PathBuf> {
    value.ok_or(WrapperError::MissingArgument(name))
}
