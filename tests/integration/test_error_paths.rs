//! Error path integration tests.
//!
//! These tests verify that invalid parameters and inputs stop the command before any output.

use std::process::{Command, Stdio};

use crate::helpers::{Fixture, run_reconcile};

#[test]
fn test_missing_alignment_file() {
    let fixture = Fixture::new();
    let intervals = fixture.write("intervals.txt", "");
    let missing = fixture.path("missing.sam");
    let output = fixture.path("out.sam");

    let result = run_reconcile(&intervals, &missing, &fixture.chromosomes(), &output, &[]);
    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("File does not exist"), "stderr: {stderr}");
    assert!(!output.exists());
}

#[test]
fn test_two_inputs_on_stdin() {
    let fixture = Fixture::new();
    let result = Command::new(env!("CARGO_BIN_EXE_fragmerge"))
        .args(["reconcile", "-b", "-", "-s", "/dev/stdin", "-c"])
        .arg(fixture.chromosomes())
        .stdin(Stdio::null())
        .output()
        .expect("Failed to run fragmerge");
    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("standard input"), "stderr: {stderr}");
}

#[test]
fn test_similarity_out_of_range() {
    let fixture = Fixture::new();
    let intervals = fixture.write("intervals.txt", "");
    let alignments = fixture.write("alignments.sam", "");
    let output = fixture.path("out.sam");

    let result = run_reconcile(
        &intervals,
        &alignments,
        &fixture.chromosomes(),
        &output,
        &["--min-similarity", "1.5"],
    );
    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("min-similarity"), "stderr: {stderr}");
}

#[test]
fn test_malformed_alignment_line() {
    let fixture = Fixture::new();
    let intervals = fixture.write("intervals.txt", "");
    let alignments = fixture.write("alignments.sam", "F1\t0\tchr1\n");
    let output = fixture.path("out.sam");

    let result = run_reconcile(&intervals, &alignments, &fixture.chromosomes(), &output, &[]);
    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("Malformed alignment line 1"), "stderr: {stderr}");
}
