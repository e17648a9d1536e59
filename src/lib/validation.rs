//! Input validation for command-line parameters and file paths.

use crate::errors::{FgalignError, Result};
use std::path::Path;

/// Validate that a file exists.
///
/// # Errors
///
/// Returns an error if the file does not exist.
pub fn validate_file_exists<P: AsRef<Path>>(path: P, description: &str) -> Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(FgalignError::InvalidFileFormat {
            file_type: description.to_string(),
            path: path.display().to_string(),
            reason: "File does not exist".to_string(),
        });
    }
    Ok(())
}

/// Validate that multiple files exist, failing on the first missing one.
///
/// # Errors
///
/// Returns an error for the first file that does not exist.
pub fn validate_files_exist<P: AsRef<Path>>(files: &[(P, &str)]) -> Result<()> {
    for (path, description) in files {
        validate_file_exists(path, description)?;
    }
    Ok(())
}
