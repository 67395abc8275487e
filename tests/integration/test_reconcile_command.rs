//! End-to-end CLI tests for the reconcile command.

use std::fs;

use crate::helpers::{Fixture, read_header_lines, read_records, run_reconcile};

/// Three paired fragments: F1 aligned to the genome and a transcript, F2 with only read 1
/// aligned, F3 unaligned.
const ALIGNMENTS: &str = "\
F1\t99\tchr1\t100\t60\t50M\t=\t250\t200\t*\t*
F1\t147\tchr1\t250\t60\t50M\t=\t100\t-200\t*\t*
F1\t99\ttx1\t100\t3\t50M\t=\t250\t200\t*\t*
F1\t147\ttx1\t250\t3\t50M\t=\t100\t-200\t*\t*
F2\t73\tchr1\t100\t60\t50M\t=\t100\t0\tACGT\tIIII
F2\t133\t*\t0\t0\t*\tchr1\t100\t0\tTTTT\tJJJJ
F3\t77\t*\t0\t0\t*\t*\t0\t0\tACGT\tIIII
F3\t141\t*\t0\t0\t*\t*\t0\t0\tTTTT\tJJJJ
";

/// Transcript tx1 covers chr1 1..=1000 on the forward strand.
const INTERVALS: &str = "\
tx1\t99\t149\tF1-A1/P1\t0\t+\ttx1\t0\t1000\tchr1/1/1000/+\t0\t+\t50
tx1\t249\t299\tF1-A1/P2\t0\t+\ttx1\t0\t1000\tchr1/1/1000/+\t0\t+\t50
";

fn reconciled_lines() -> Vec<String> {
    [
        "F1\t99\tchr1\t100\t60\t50M\t=\t250\t200\t*\t*\tNH:i:1",
        "F1\t147\tchr1\t250\t60\t50M\t=\t100\t-200\t*\t*\tNH:i:1",
        "F2\t73\tchr1\t100\t60\t50M\t*\t0\t0\tACGT\tIIII\tNH:i:1",
        "F2\t141\t*\t0\t0\t*\t*\t0\t0\tTTTT\tJJJJ",
        "F3\t77\t*\t0\t0\t*\t*\t0\t0\tACGT\tIIII",
        "F3\t141\t*\t0\t0\t*\t*\t0\t0\tTTTT\tJJJJ",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

#[test]
fn test_reconcile_with_reconciled_tail() {
    let fixture = Fixture::new();
    let intervals = fixture.write("intervals.txt", INTERVALS);
    let alignments = fixture.write("alignments.sam", ALIGNMENTS);
    let output = fixture.path("out.sam");

    let result = run_reconcile(
        &intervals,
        &alignments,
        &fixture.chromosomes(),
        &output,
        &["--reconcile-tail"],
    );
    assert!(result.status.success(), "stderr: {}", String::from_utf8_lossy(&result.stderr));

    assert_eq!(read_records(&output), reconciled_lines());
    assert!(read_header_lines(&output).is_empty());
}

#[test]
fn test_reconcile_passes_tail_through() {
    let fixture = Fixture::new();
    let intervals = fixture.write("intervals.txt", INTERVALS);
    let alignments = fixture.write("alignments.sam", ALIGNMENTS);
    let output = fixture.path("out.sam");

    let result = run_reconcile(&intervals, &alignments, &fixture.chromosomes(), &output, &[]);
    assert!(result.status.success(), "stderr: {}", String::from_utf8_lossy(&result.stderr));

    let records = read_records(&output);
    let expected_tail: Vec<&str> = ALIGNMENTS.lines().skip(4).collect();
    assert_eq!(records.len(), 6);
    assert_eq!(records[..2], reconciled_lines()[..2]);
    assert_eq!(records[2..], expected_tail[..]);
}

#[test]
fn test_reconcile_gzipped_alignments() {
    let fixture = Fixture::new();
    let intervals = fixture.write("intervals.txt", INTERVALS);
    let alignments = fixture.write_gz("alignments.sam.gz", ALIGNMENTS);
    let output = fixture.path("out.sam");

    let result = run_reconcile(
        &intervals,
        &alignments,
        &fixture.chromosomes(),
        &output,
        &["--reconcile-tail", "-q"],
    );
    assert!(result.status.success(), "stderr: {}", String::from_utf8_lossy(&result.stderr));
    assert_eq!(read_records(&output), reconciled_lines());
}

#[test]
fn test_reconcile_rewrites_program_record() {
    let fixture = Fixture::new();
    let intervals = fixture.write("intervals.txt", INTERVALS);
    let alignments = fixture.write("alignments.sam", ALIGNMENTS);
    let header = fixture.write(
        "header.sam",
        "@HD\tVN:1.6\tSO:queryname\n@SQ\tSN:chr1\tLN:248956422\n@PG\tID:star\tPN:STAR\n",
    );
    let output = fixture.path("out.sam");

    let result = run_reconcile(
        &intervals,
        &alignments,
        &fixture.chromosomes(),
        &output,
        &["-H", header.to_str().unwrap()],
    );
    assert!(result.status.success(), "stderr: {}", String::from_utf8_lossy(&result.stderr));

    let lines = read_header_lines(&output);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "@HD\tVN:1.6\tSO:queryname");
    assert_eq!(lines[1], "@SQ\tSN:chr1\tLN:248956422");
    assert!(lines[2].starts_with("@PG\tID:fragmerge\tPN:fragmerge\tVN:"), "{}", lines[2]);
    assert!(lines[2].contains("reconcile"));
    assert!(!lines[2].contains("STAR"));
}

#[test]
fn test_reconcile_writes_metrics() {
    let fixture = Fixture::new();
    let intervals = fixture.write("intervals.txt", INTERVALS);
    let alignments = fixture.write("alignments.sam", ALIGNMENTS);
    let output = fixture.path("out.sam");
    let metrics = fixture.path("metrics.tsv");

    let result = run_reconcile(
        &intervals,
        &alignments,
        &fixture.chromosomes(),
        &output,
        &["--reconcile-tail", "--metrics", metrics.to_str().unwrap()],
    );
    assert!(result.status.success(), "stderr: {}", String::from_utf8_lossy(&result.stderr));

    let contents = fs::read_to_string(&metrics).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("fragments\tfragments_with_overlaps\tcomputed_pairs\t"));
    // three fragments, one with overlaps, one computed pair already among the alignments
    assert!(lines[1].starts_with("3\t1\t1\t1\t"), "{}", lines[1]);
}

#[test]
fn test_reconcile_single_end_alignments() {
    let fixture = Fixture::new();
    let intervals = fixture.write("intervals.txt", "");
    let alignments = fixture.write(
        "alignments.sam",
        "S1\t0\tchr1\t100\t60\t50M\t*\t0\t0\t*\t*\n\
         S1\t256\tchr2\t100\t60\t50M\t*\t0\t0\t*\t*\n\
         S1\t0\ttx9\t100\t60\t50M\t*\t0\t0\t*\t*\n",
    );
    let output = fixture.path("out.sam");

    let result = run_reconcile(
        &intervals,
        &alignments,
        &fixture.chromosomes(),
        &output,
        &["--reconcile-tail", "--single-read"],
    );
    assert!(result.status.success(), "stderr: {}", String::from_utf8_lossy(&result.stderr));
    assert_eq!(
        read_records(&output),
        vec![
            "S1\t0\tchr1\t100\t60\t50M\t*\t0\t0\t*\t*\tNH:i:2".to_string(),
            "S1\t256\tchr2\t100\t60\t50M\t*\t0\t0\t*\t*\tNH:i:2".to_string(),
        ]
    );
}

#[test]
fn test_reconcile_rejects_unsorted_alignments() {
    let fixture = Fixture::new();
    let intervals = fixture.write("intervals.txt", "");
    let alignments = fixture.write(
        "alignments.sam",
        "F2\t4\t*\t0\t0\t*\t*\t0\t0\tACGT\tIIII\nF1\t4\t*\t0\t0\t*\t*\t0\t0\tACGT\tIIII\n",
    );
    let output = fixture.path("out.sam");

    let result = run_reconcile(&intervals, &alignments, &fixture.chromosomes(), &output, &[]);
    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("not sorted"), "stderr: {stderr}");
}

#[test]
fn test_reconcile_rejects_orphan_interval_fragment() {
    let fixture = Fixture::new();
    let intervals = fixture.write(
        "intervals.txt",
        "tx1\t99\t149\tF0-A1/P1\t0\t+\ttx1\t0\t1000\tchr1/1/1000/+\t0\t+\t50\n",
    );
    let alignments = fixture.write("alignments.sam", ALIGNMENTS);
    let output = fixture.path("out.sam");

    let result = run_reconcile(&intervals, &alignments, &fixture.chromosomes(), &output, &[]);
    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("'F0' has no alignment records"), "stderr: {stderr}");
}
