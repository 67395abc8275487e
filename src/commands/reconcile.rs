//! `Reconcile` command implementation.
//!
//! Merges alignments projected from transcript interval overlaps with the genome alignments of
//! each fragment and writes one SAM stream with `NH` multiplicities.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use fragmerge_lib::config::{
    ChromosomeSet, DEFAULT_MIN_OVERLAP_FRACTION, DEFAULT_MIN_SIMILARITY, OverlapRule,
    OverlapThresholds, ReconcileConfig, TailPolicy,
};
use fragmerge_lib::group::{alignment_groups, interval_groups};
use fragmerge_lib::header::read_header;
use fragmerge_lib::io::{open_reader, open_writer};
use fragmerge_lib::logging::{OperationTimer, log_reconcile_summary};
use fragmerge_lib::merge::FragmentMerger;
use fragmerge_lib::validation::{validate_files_exist, validate_single_stdin};
use fragmerge_lib::writer::SamWriter;
use log::{info, warn};

use super::command::Command;

/// Merges transcript-projected and genome alignments per fragment
#[derive(Parser, Debug)]
#[command(
    name = "reconcile",
    about = "\x1b[38;5;72m[ALIGNMENT]\x1b[0m      \x1b[36mMerge transcript-projected and genome alignments per fragment\x1b[0m",
    long_about = r#"
Reconciles two views of the same sequenced fragments into one SAM stream.

The interval-overlap input lists, per read, the exonic blocks its transcript alignment overlaps.
Those blocks are projected back onto the genome to build spliced genome alignments. The
alignment input holds the genome (and transcript) alignment records. Both inputs must be grouped
by fragment and sorted by fragment id in byte order, for example with:

  LC_ALL=C sort -k1,1 alignments.sam > alignments.sorted.sam

For each fragment the projected pairs and the original pairs are deduplicated against each
other, ranked so that complete pairs come first, and written with an NH tag holding the number
of distinct placements. Reads without any alignment are written as unmapped records so every
read of every fragment appears in the output.

An interval-overlap fragment with no alignment records is an error. Fragments after the last
interval-overlap fragment are copied through unchanged unless --reconcile-tail is given.
"#
)]
pub struct Reconcile {
    /// Interval-overlap input (`-` for stdin, `.gz` supported)
    #[arg(short = 'b', long = "intervals", default_value = "-")]
    pub intervals: PathBuf,

    /// Alignment-record input (`-` for stdin, `.gz` supported)
    #[arg(short = 's', long = "alignments")]
    pub alignments: PathBuf,

    /// File of chromosome names, one per line (a FASTA index works)
    #[arg(short = 'c', long = "chromosomes")]
    pub chromosomes: PathBuf,

    /// SAM header to copy into the output; its first @PG line is replaced
    #[arg(short = 'H', long = "header")]
    pub header: Option<PathBuf>,

    /// Output SAM (`-` for stdout, `.gz` compresses)
    #[arg(short = 'o', long = "output", default_value = "-")]
    pub output: PathBuf,

    /// Treat the alignments as single-read even when the paired flag is set
    #[arg(short = 'S', long = "single-read")]
    pub single_read: bool,

    /// Warn about each fragment that needed a synthesized unmapped record
    #[arg(short = 'W', long = "warnings")]
    pub warnings: bool,

    /// Minimum overlap of two alignments, as a fraction of the first one's span
    #[arg(long = "min-overlap-fraction", default_value_t = DEFAULT_MIN_OVERLAP_FRACTION)]
    pub min_overlap_fraction: f64,

    /// Minimum positional similarity of two overlapping alignments
    #[arg(long = "min-similarity", default_value_t = DEFAULT_MIN_SIMILARITY)]
    pub min_similarity: f64,

    /// How two alignments are compared when deduplicating
    #[arg(long = "overlap-rule", value_enum, default_value_t = OverlapRule::SpanSimilarity)]
    pub overlap_rule: OverlapRule,

    /// Count and write every rank of pairs, even when a complete pair exists
    #[arg(long = "all-buckets")]
    pub all_buckets: bool,

    /// Reconcile fragments that follow the last interval-overlap fragment
    #[arg(long = "reconcile-tail")]
    pub reconcile_tail: bool,

    /// Output file for run metrics
    #[arg(long = "metrics")]
    pub metrics: Option<PathBuf>,

    /// Number of fragments between progress log lines
    #[arg(long = "progress-interval", default_value_t = 1_000_000)]
    pub progress_interval: u64,
}

impl Command for Reconcile {
    fn execute(&self, command_line: &str) -> Result<()> {
        let mut inputs = vec![
            (&self.intervals, "Interval-overlap file"),
            (&self.alignments, "Alignment file"),
            (&self.chromosomes, "Chromosome file"),
        ];
        if let Some(header) = &self.header {
            inputs.push((header, "Header file"));
        }
        validate_files_exist(&inputs)?;
        validate_single_stdin(&inputs)?;

        info!("Reconcile");
        info!("  Interval overlaps: {}", self.intervals.display());
        info!("  Alignments: {}", self.alignments.display());
        info!("  Chromosomes: {}", self.chromosomes.display());
        info!("  Output: {}", self.output.display());
        info!("  Overlap rule: {:?}", self.overlap_rule);

        let chromosomes = ChromosomeSet::from_reader(open_reader(&self.chromosomes)?)
            .with_context(|| {
                format!("Failed to read chromosomes: {}", self.chromosomes.display())
            })?;
        if chromosomes.is_empty() {
            warn!("No chromosomes in {}; no alignment is on-genome", self.chromosomes.display());
        }
        info!("  Loaded {} chromosomes", chromosomes.len());

        let header = match &self.header {
            Some(path) => read_header(open_reader(path)?, crate::version::VERSION, command_line)
                .with_context(|| format!("Failed to read header: {}", path.display()))?,
            None => Vec::new(),
        };

        let mut alignments = alignment_groups(open_reader(&self.alignments)?).peekable();
        let paired_end = !self.single_read
            && match alignments.peek() {
                Some(Ok(group)) => group.records.first().is_some_and(|r| r.is_paired()),
                _ => false,
            };
        info!("  Paired-end: {paired_end}");

        let tail =
            if self.reconcile_tail { TailPolicy::Reconcile } else { TailPolicy::PassThrough };
        let thresholds = OverlapThresholds::new(self.min_overlap_fraction, self.min_similarity)?;
        let config = ReconcileConfig::new(paired_end, chromosomes)
            .with_thresholds(thresholds)
            .with_overlap_rule(self.overlap_rule)
            .with_paired_preferred(!self.all_buckets)
            .with_tail(tail)
            .with_warn_on_default(self.warnings);

        let interval_chromosomes = config.chromosomes.clone();
        let intervals = interval_groups(open_reader(&self.intervals)?, move |record| {
            record.is_informative(&interval_chromosomes)
        });

        let mut writer = SamWriter::new(open_writer(&self.output)?);
        writer.write_header(&header)?;

        let timer = OperationTimer::new("Reconciling fragments");
        let stats = FragmentMerger::new(&config)
            .with_progress_interval(self.progress_interval)
            .run(alignments, intervals, &mut writer)?;
        let records_written = writer.records_written();
        writer.finish().with_context(|| format!("Failed to write {}", self.output.display()))?;
        timer.log_completion(stats.fragments);

        log_reconcile_summary(&stats);
        info!("Wrote {records_written} records to {}", self.output.display());

        if let Some(metrics) = &self.metrics {
            stats.write_metrics(metrics)?;
            info!("Wrote metrics to {}", metrics.display());
        }
        Ok(())
    }
}
