//! Output header built from a template header file.
//!
//! Only `@` lines of the template are kept. The first `@PG` line is replaced by a program record
//! for this tool and any later `@PG` lines are dropped, so the output carries a single program id.

use std::io::BufRead;

use crate::errors::Result;

/// Program id and name written in the `@PG` record.
pub const PROGRAM_ID: &str = "fragmerge";

/// Builds the `@PG` line for this run.
///
/// # Examples
///
/// ```
/// use fragmerge_lib::header::program_line;
///
/// assert_eq!(
///     program_line("0.1.0", "fragmerge reconcile -s in.sam"),
///     "@PG\tID:fragmerge\tPN:fragmerge\tVN:0.1.0\tCL:fragmerge reconcile -s in.sam"
/// );
/// ```
#[must_use]
pub fn program_line(version: &str, command_line: &str) -> String {
    // tabs or newlines in CL would break the header line
    let command_line: String =
        command_line.chars().map(|c| if c == '\t' || c == '\n' { ' ' } else { c }).collect();
    format!("@PG\tID:{PROGRAM_ID}\tPN:{PROGRAM_ID}\tVN:{version}\tCL:{command_line}")
}

/// Reads a template header and rewrites its program record.
///
/// Returns the header lines without line terminators. A template without any `@PG` line is
/// returned unchanged apart from dropped non-header lines.
///
/// # Errors
///
/// Returns an I/O error if the reader fails.
pub fn read_header<R: BufRead>(
    reader: R,
    version: &str,
    command_line: &str,
) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    let mut program_written = false;
    for line in reader.lines() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if !line.starts_with('@') {
            continue;
        }
        if line.starts_with("@PG\t") || line == "@PG" {
            if !program_written {
                lines.push(program_line(version, command_line));
                program_written = true;
            }
            continue;
        }
        lines.push(line.to_string());
    }
    Ok(lines)
}
