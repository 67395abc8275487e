//! Input fixtures and a runner for the `reconcile` command.

#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::TempDir;

/// Chromosome names used by every fixture.
pub const CHROMOSOMES: &str = "chr1\t248956422\nchr2\t242193529\n";

/// A temporary directory holding the inputs and outputs of one run.
pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self { dir: TempDir::new().expect("Failed to create temp dir") }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Writes a text file and returns its path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, contents).expect("Failed to write fixture");
        path
    }

    /// Writes a gzip-compressed text file and returns its path.
    pub fn write_gz(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        let file = fs::File::create(&path).expect("Failed to create fixture");
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(contents.as_bytes()).expect("Failed to write fixture");
        encoder.finish().expect("Failed to finish gzip fixture");
        path
    }

    /// Writes the standard chromosome list.
    pub fn chromosomes(&self) -> PathBuf {
        self.write("chromosomes.txt", CHROMOSOMES)
    }
}

/// Runs `fragmerge reconcile` with the given inputs plus extra arguments.
pub fn run_reconcile(
    intervals: &Path,
    alignments: &Path,
    chromosomes: &Path,
    output: &Path,
    extra: &[&str],
) -> Output {
    Command::new(env!("CARGO_BIN_EXE_fragmerge"))
        .arg("reconcile")
        .arg("-b")
        .arg(intervals)
        .arg("-s")
        .arg(alignments)
        .arg("-c")
        .arg(chromosomes)
        .arg("-o")
        .arg(output)
        .args(extra)
        .output()
        .expect("Failed to run fragmerge")
}

/// Reads the non-header lines of a SAM output.
pub fn read_records(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .expect("Failed to read output")
        .lines()
        .filter(|line| !line.starts_with('@'))
        .map(str::to_string)
        .collect()
}

/// Reads the header lines of a SAM output.
pub fn read_header_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .expect("Failed to read output")
        .lines()
        .filter(|line| line.starts_with('@'))
        .map(str::to_string)
        .collect()
}
