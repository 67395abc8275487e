//! Projection of transcript alignments onto the genome.
//!
//! An interval-overlap group lists, for every transcript alignment of a fragment, the exons the
//! aligned read touches. Each touched stretch of transcript maps to one stretch of the exon's
//! genomic locus, so the read's genomic alignment is the union of those stretches joined by
//! introns. The remaining columns (name, flags, sequence, tags) come from the transcript
//! alignment record itself, which must be present in the fragment's alignment group.

use ahash::{AHashMap, AHashSet};
use log::{debug, warn};
use noodles::sam::alignment::record::Flags;
use noodles::sam::alignment::record::cigar::Op;
use noodles::sam::alignment::record::cigar::op::Kind;

use crate::config::ChromosomeSet;
use crate::dna::{reverse_complement, reverse_qualities};
use crate::errors::{FragmergeError, Result};
use crate::group::{AlignmentGroup, IntervalGroup};
use crate::interval::{IntervalOverlapRecord, Strand};
use crate::pair::AlignmentPair;
use crate::record::{AlignmentRecord, UNMAPPED_REFERENCE};

/// Mapping quality floor for projected alignments.
pub const MIN_PROJECTED_MAPPING_QUALITY: u8 = 10;

/// A genomic stretch covered by part of a read, 1-based inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Block {
    start: i64,
    end: i64,
}

impl Block {
    fn len(self) -> i64 {
        self.end - self.start + 1
    }
}

/// Overlaps of one read alignment, keyed by alignment id and read end.
#[derive(Default)]
struct ReadOverlaps<'a> {
    first: Vec<&'a IntervalOverlapRecord>,
    second: Vec<&'a IntervalOverlapRecord>,
}

/// Computes the genomic alignment pairs implied by a fragment's interval overlaps.
///
/// Pairs come out in the order their alignment ids first appear; pairs with equal keys are kept
/// once.
///
/// # Errors
///
/// Returns [`FragmergeError::MissingSourceAlignment`] when an overlap names a transcript
/// alignment that is not in `alignments`, and [`FragmergeError::InconsistentPair`] when the
/// projected reads of one alignment cannot form a pair.
pub fn compute_pairs(
    overlaps: &IntervalGroup,
    alignments: &AlignmentGroup,
    chromosomes: &ChromosomeSet,
) -> Result<Vec<AlignmentPair>> {
    let mut order: Vec<&str> = Vec::new();
    let mut by_alignment: AHashMap<&str, ReadOverlaps<'_>> = AHashMap::new();
    for overlap in &overlaps.records {
        let entry = by_alignment.entry(overlap.alignment_id.as_str()).or_insert_with(|| {
            order.push(overlap.alignment_id.as_str());
            ReadOverlaps::default()
        });
        if overlap.read_index == 2 {
            entry.second.push(overlap);
        } else {
            entry.first.push(overlap);
        }
    }

    let mut seen = AHashSet::new();
    let mut pairs = Vec::new();
    for alignment_id in order {
        let Some(reads) = by_alignment.get(alignment_id) else { continue };
        let first = project_read(&reads.first, alignments, chromosomes)?;
        let second = project_read(&reads.second, alignments, chromosomes)?;

        let pair = match (first, second) {
            (Some(mut first), Some(mut second)) => {
                link_mates(&mut first, &mut second);
                AlignmentPair::mates(first, second)?
            }
            (Some(mut lone), None) | (None, Some(mut lone)) => {
                clear_mate(&mut lone);
                AlignmentPair::single(lone)?
            }
            (None, None) => continue,
        };

        if seen.insert(pair.key()) {
            pairs.push(pair);
        } else {
            debug!("Alignment {alignment_id} projects onto an already computed pair");
        }
    }
    Ok(pairs)
}

/// Projects one read's transcript alignment onto the genome.
///
/// Returns `Ok(None)` when the read has no overlaps or its projection is unusable (exons on
/// different chromosomes or strands, a non-chromosome target, or blocks that cannot hold the
/// read).
fn project_read(
    overlaps: &[&IntervalOverlapRecord],
    alignments: &AlignmentGroup,
    chromosomes: &ChromosomeSet,
) -> Result<Option<AlignmentRecord>> {
    let Some(&first) = overlaps.first() else { return Ok(None) };

    let source = alignments
        .records
        .iter()
        .find(|r| {
            r.read_index == first.read_index
                && r.reference_name == first.reference_name
                && r.position == first.read_start
        })
        .ok_or_else(|| FragmergeError::MissingSourceAlignment {
            fragment_id: first.fragment_id.clone(),
            reference_name: first.reference_name.clone(),
            position: first.read_start,
            read_index: first.read_index,
        })?;

    let chromosome = &first.locus.chromosome;
    let strand = first.locus.strand;
    if overlaps.iter().any(|o| o.locus.chromosome != *chromosome || o.locus.strand != strand) {
        debug!(
            "Alignment {} read {} spans exons on different chromosomes or strands",
            first.alignment_id, first.read_index
        );
        return Ok(None);
    }
    if !chromosomes.contains(chromosome) {
        debug!("Alignment {} projects onto non-chromosome {chromosome}", first.alignment_id);
        return Ok(None);
    }

    let mut blocks: Vec<Block> = overlaps.iter().filter_map(|o| project_overlap(o)).collect();
    if blocks.is_empty() {
        return Ok(None);
    }
    blocks.sort_by_key(|b| (b.start, b.end));
    let blocks = merge_blocks(blocks);

    let reverse = strand == Strand::Reverse;
    let (mut leading_clip, mut trailing_clip) = soft_clips(&source.cigar);
    if reverse {
        std::mem::swap(&mut leading_clip, &mut trailing_clip);
    }
    let body_length = source.read_length() as i64 - leading_clip - trailing_clip;
    let Some(cigar) = spliced_cigar(&blocks, body_length, leading_clip, trailing_clip) else {
        warn!(
            "Cannot fit read {} of {} ({} bases) onto its projected exon blocks",
            first.read_index, source.query_name, body_length
        );
        return Ok(None);
    };

    let mut flags = source.flags;
    flags.remove(Flags::SECONDARY);
    if reverse {
        flags.toggle(Flags::REVERSE_COMPLEMENTED);
    }

    let (sequence, quality) = if reverse {
        (reverse_complement(&source.sequence), reverse_qualities(&source.quality))
    } else {
        (source.sequence.clone(), source.quality.clone())
    };

    Ok(Some(AlignmentRecord {
        query_name: source.query_name.clone(),
        fragment_id: source.fragment_id.clone(),
        read_index: source.read_index,
        flags,
        reference_name: chromosome.clone(),
        position: blocks[0].start,
        mapping_quality: source.mapping_quality.max(MIN_PROJECTED_MAPPING_QUALITY),
        cigar,
        mate_reference_name: UNMAPPED_REFERENCE.to_string(),
        mate_position: 0,
        template_length: 0,
        sequence,
        quality,
        fields: source.fields.iter().filter(|f| !f.starts_with("NH:")).cloned().collect(),
    }))
}

/// Maps the read-covered part of one exon onto the genome.
fn project_overlap(overlap: &IntervalOverlapRecord) -> Option<Block> {
    let start = overlap.read_start.max(overlap.exon_start);
    let end = overlap.read_end.min(overlap.exon_end);
    if start > end {
        return None;
    }
    let (low, high) = (start - overlap.exon_start, end - overlap.exon_start);
    let locus = &overlap.locus;
    let block = match locus.strand {
        Strand::Forward => Block { start: locus.start + low, end: locus.start + high },
        Strand::Reverse => Block { start: locus.end - high, end: locus.end - low },
    };
    (block.start >= locus.start && block.end <= locus.end).then_some(block)
}

/// Merges sorted blocks that overlap or touch.
fn merge_blocks(blocks: Vec<Block>) -> Vec<Block> {
    let mut merged: Vec<Block> = Vec::with_capacity(blocks.len());
    for block in blocks {
        match merged.last_mut() {
            Some(last) if block.start <= last.end + 1 => last.end = last.end.max(block.end),
            _ => merged.push(block),
        }
    }
    merged
}

fn soft_clips(cigar: &[Op]) -> (i64, i64) {
    let clip = |op: Option<&Op>| match op {
        Some(op) if op.kind() == Kind::SoftClip => op.len() as i64,
        _ => 0,
    };
    let leading = clip(cigar.first());
    let trailing = if cigar.len() > 1 { clip(cigar.last()) } else { 0 };
    (leading, trailing)
}

/// Builds `[S] M (N M)* [S]`, resizing the last match so the CIGAR consumes `body_length`
/// aligned bases. Returns `None` if the resize would empty the last block.
fn spliced_cigar(
    blocks: &[Block],
    body_length: i64,
    leading_clip: i64,
    trailing_clip: i64,
) -> Option<Vec<Op>> {
    let projected: i64 = blocks.iter().map(|b| b.len()).sum();
    let last_len = blocks.last()?.len() + (body_length - projected);
    if last_len <= 0 {
        return None;
    }

    let mut ops = Vec::with_capacity(blocks.len() * 2 + 2);
    if leading_clip > 0 {
        ops.push(Op::new(Kind::SoftClip, leading_clip as usize));
    }
    for (i, block) in blocks.iter().enumerate() {
        if i > 0 {
            let intron = block.start - blocks[i - 1].end - 1;
            ops.push(Op::new(Kind::Skip, intron as usize));
        }
        let len = if i + 1 == blocks.len() { last_len } else { block.len() };
        ops.push(Op::new(Kind::Match, len as usize));
    }
    if trailing_clip > 0 {
        ops.push(Op::new(Kind::SoftClip, trailing_clip as usize));
    }
    Some(ops)
}

/// Points two projected mates at each other.
fn link_mates(first: &mut AlignmentRecord, second: &mut AlignmentRecord) {
    let same_reference = first.reference_name == second.reference_name;
    let template_length = if same_reference {
        let left = first.position.min(second.position);
        let right = first.alignment_end().max(second.alignment_end());
        right - left + 1
    } else {
        0
    };
    let first_sign = if first.position <= second.position { 1 } else { -1 };

    let first_view = (first.reference_name.clone(), first.position, first.is_reverse());
    let second_view = (second.reference_name.clone(), second.position, second.is_reverse());
    for (record, (mate_reference, mate_position, mate_reverse), sign) in
        [(first, second_view, first_sign), (second, first_view, -first_sign)]
    {
        record.mate_reference_name =
            if same_reference { "=".to_string() } else { mate_reference };
        record.mate_position = mate_position;
        record.template_length = sign * template_length;
        record.flags.remove(Flags::MATE_UNMAPPED);
        record.flags.set(Flags::MATE_REVERSE_COMPLEMENTED, mate_reverse);
    }
}

/// Marks a projected read whose mate has no projection.
fn clear_mate(record: &mut AlignmentRecord) {
    if record.is_paired() {
        record.flags.insert(Flags::MATE_UNMAPPED);
        record.flags.remove(Flags::PROPERLY_SEGMENTED);
        record.flags.remove(Flags::MATE_REVERSE_COMPLEMENTED);
    }
    record.mate_reference_name = UNMAPPED_REFERENCE.to_string();
    record.mate_position = 0;
    record.template_length = 0;
}
