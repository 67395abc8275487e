//! Input validation for command-line parameters and file paths.
//!
//! Failures use the structured error types from [`crate::errors`].

use std::path::Path;

use crate::errors::{FragmergeError, Result};
use crate::io::is_stdin_path;

/// Validate that a file exists. Standard input (`-` or `/dev/stdin`) always passes.
///
/// # Errors
/// Returns [`FragmergeError::InvalidFileFormat`] if the file does not exist.
///
/// # Example
/// ```
/// use fragmerge_lib::validation::validate_file_exists;
///
/// assert!(validate_file_exists("/nonexistent/file.sam", "Alignment file").is_err());
/// assert!(validate_file_exists("-", "Alignment file").is_ok());
/// ```
pub fn validate_file_exists<P: AsRef<Path>>(path: P, description: &str) -> Result<()> {
    let path_ref = path.as_ref();
    if !is_stdin_path(path_ref) && !path_ref.exists() {
        return Err(FragmergeError::InvalidFileFormat {
            file_type: description.to_string(),
            path: path_ref.display().to_string(),
            reason: "File does not exist".to_string(),
        });
    }
    Ok(())
}

/// Validate that multiple files exist, failing on the first missing one.
///
/// # Errors
/// Returns an error for the first file that doesn't exist.
pub fn validate_files_exist<P: AsRef<Path>>(files: &[(P, &str)]) -> Result<()> {
    for (path, desc) in files {
        validate_file_exists(path, desc)?;
    }
    Ok(())
}

/// Validate that at most one of the inputs reads standard input.
///
/// # Errors
/// Returns [`FragmergeError::InvalidParameter`] naming the second input that reads stdin.
pub fn validate_single_stdin<P: AsRef<Path>>(inputs: &[(P, &str)]) -> Result<()> {
    let mut stdin_inputs = inputs.iter().filter(|(path, _)| is_stdin_path(path.as_ref()));
    if let (Some((_, first)), Some((_, second))) = (stdin_inputs.next(), stdin_inputs.next()) {
        return Err(FragmergeError::InvalidParameter {
            parameter: (*second).to_string(),
            reason: format!("{first} already reads from standard input"),
        });
    }
    Ok(())
}
