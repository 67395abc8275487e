//! Orientation changes for SAM sequence and quality columns.
//!
//! Both functions leave the SAM placeholder `*` untouched.

use crate::record::UNMAPPED_REFERENCE;

/// Complements one IUPAC base, preserving case. Unknown characters are returned unchanged.
#[inline]
#[must_use]
pub const fn complement(base: char) -> char {
    match base {
        'A' => 'T',
        'T' | 'U' => 'A',
        'C' => 'G',
        'G' => 'C',
        'R' => 'Y',
        'Y' => 'R',
        'K' => 'M',
        'M' => 'K',
        'B' => 'V',
        'V' => 'B',
        'D' => 'H',
        'H' => 'D',
        'a' => 't',
        't' | 'u' => 'a',
        'c' => 'g',
        'g' => 'c',
        'r' => 'y',
        'y' => 'r',
        'k' => 'm',
        'm' => 'k',
        'b' => 'v',
        'v' => 'b',
        'd' => 'h',
        'h' => 'd',
        other => other,
    }
}

/// Reverse complements a SEQ column.
///
/// # Examples
///
/// ```
/// use fragmerge_lib::dna::reverse_complement;
///
/// assert_eq!(reverse_complement("AACGN"), "NCGTT");
/// assert_eq!(reverse_complement("acgT"), "Acgt");
/// assert_eq!(reverse_complement("*"), "*");
/// ```
#[must_use]
pub fn reverse_complement(sequence: &str) -> String {
    if sequence == UNMAPPED_REFERENCE {
        return sequence.to_string();
    }
    sequence.chars().rev().map(complement).collect()
}

/// Reverses a QUAL column.
#[must_use]
pub fn reverse_qualities(qualities: &str) -> String {
    if qualities == UNMAPPED_REFERENCE {
        return qualities.to_string();
    }
    qualities.chars().rev().collect()
}
