//! Opening line-oriented inputs and outputs.
//!
//! Files go through [`fgoxide::io::Io`], which transparently (de)compresses paths ending in
//! `.gz`/`.bgz`. The paths `-` and `/dev/stdin` (`/dev/stdout` for output) select the standard
//! streams.

use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use fgoxide::io::Io;

use crate::errors::Result;

/// Buffer size for readers and writers.
pub const BUFFER_SIZE: usize = 64 * 1024;

/// Compression level for gzip output.
const COMPRESSION_LEVEL: u32 = 5;

/// Check if a path refers to stdin.
///
/// # Examples
/// ```
/// use fragmerge_lib::io::is_stdin_path;
/// use std::path::Path;
///
/// assert!(is_stdin_path(Path::new("-")));
/// assert!(is_stdin_path(Path::new("/dev/stdin")));
/// assert!(!is_stdin_path(Path::new("reads.sam")));
/// ```
pub fn is_stdin_path<P: AsRef<Path>>(path: P) -> bool {
    let path_str = path.as_ref().to_string_lossy();
    path_str == "-" || path_str == "/dev/stdin"
}

/// Check if a path refers to stdout.
pub fn is_stdout_path<P: AsRef<Path>>(path: P) -> bool {
    let path_str = path.as_ref().to_string_lossy();
    path_str == "-" || path_str == "/dev/stdout"
}

/// Opens a buffered line reader on a file or stdin.
///
/// # Errors
///
/// Returns an error if the file cannot be opened.
pub fn open_reader<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead + Send>> {
    let path = path.as_ref();
    if is_stdin_path(path) {
        return Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, io::stdin())));
    }
    Ok(Io::new(COMPRESSION_LEVEL, BUFFER_SIZE).new_reader(path)?)
}

/// Opens a buffered writer on a file or stdout.
///
/// # Errors
///
/// Returns an error if the file cannot be created.
pub fn open_writer<P: AsRef<Path>>(path: P) -> Result<Box<dyn Write + Send>> {
    let path = path.as_ref();
    if is_stdout_path(path) {
        return Ok(Box::new(BufWriter::with_capacity(BUFFER_SIZE, io::stdout())));
    }
    Ok(Box::new(Io::new(COMPRESSION_LEVEL, BUFFER_SIZE).new_writer(path)?))
}
