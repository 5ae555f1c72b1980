//! Utility functions for error handling
//!
//! Path-aware wrappers around filesystem calls so every I/O failure names the
//! file and why it was being touched.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{CircusError, Result};

fn io_error(path: &Path, purpose: &str, source: io::Error) -> CircusError {
    CircusError::Io {
        path: path.to_path_buf(),
        purpose: purpose.to_string(),
        source,
    }
}

/// Safely open a file with rich error information
///
/// # Arguments
/// * `path` - The path to the file to open
/// * `purpose` - Why the file is being opened (for error context)
pub fn safe_open_file(path: &Path, purpose: &str) -> Result<fs::File> {
    if path.exists() && !path.is_file() {
        return Err(io_error(
            path,
            purpose,
            io::Error::new(io::ErrorKind::InvalidInput, "path is not a file"),
        ));
    }

    fs::File::open(path).map_err(|e| io_error(path, purpose, e))
}

/// Safely read a file to string with rich error information
pub fn safe_read_to_string(path: &Path, purpose: &str) -> Result<String> {
    let mut file = safe_open_file(path, purpose)?;

    let mut content = String::new();
    io::Read::read_to_string(&mut file, &mut content).map_err(|e| {
        let purpose = match e.kind() {
            io::ErrorKind::InvalidData => format!("{purpose} (file is not valid UTF-8)"),
            _ => purpose.to_string(),
        };
        io_error(path, &purpose, e)
    })?;
    Ok(content)
}

/// Write a fully rendered buffer to `path`, creating parent directories first
pub fn safe_write(path: &Path, contents: &[u8], purpose: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| io_error(parent, purpose, e))?;
    }
    fs::write(path, contents).map_err(|e| io_error(path, purpose, e))
}
