//! Custom error types for fragmerge operations.

use thiserror::Error;

/// Result type alias for fragmerge operations
pub type Result<T> = std::result::Result<T, FragmergeError>;

/// Error type for fragmerge operations
#[derive(Error, Debug)]
pub enum FragmergeError {
    /// A line could not be parsed or is missing a required field
    #[error("Malformed {source_name} line {line_number}: {reason}\n  line: {line}")]
    MalformedLine {
        /// Which input the line came from (e.g. "alignment", "interval-overlap")
        source_name: String,
        /// 1-based line number within that input
        line_number: u64,
        /// Explanation of the problem
        reason: String,
        /// The offending line
        line: String,
    },

    /// Fragment ids went backwards (or repeated non-contiguously) within one stream
    #[error(
        "Fragment ids in the {source_name} input are not sorted: '{current}' follows '{previous}'"
    )]
    OrderingViolation {
        /// Which input violated the ordering
        source_name: String,
        /// The fragment id seen before
        previous: String,
        /// The fragment id that broke the ordering
        current: String,
    },

    /// An interval-overlap fragment has no alignment group
    #[error(
        "Interval-overlap fragment '{fragment_id}' has no alignment records (next alignment fragment: {})",
        .next_alignment_fragment.as_deref().unwrap_or("<end of input>")
    )]
    OrphanIntervalFragment {
        /// The interval-overlap fragment id
        fragment_id: String,
        /// The alignment fragment the stream was positioned on, if any
        next_alignment_fragment: Option<String>,
    },

    /// A default pair could not be synthesized because a read end is absent
    #[error("No read {read_index} record found for fragment '{fragment_id}'")]
    MissingReadEnd {
        /// The fragment id
        fragment_id: String,
        /// The read end (1 or 2) that is missing
        read_index: u8,
    },

    /// An interval overlap refers to a transcript alignment missing from the alignment group
    #[error(
        "No alignment record for read {read_index} of fragment '{fragment_id}' at {reference_name}:{position}"
    )]
    MissingSourceAlignment {
        /// The fragment id
        fragment_id: String,
        /// Transcript or junction reference of the alignment
        reference_name: String,
        /// 1-based alignment start
        position: i64,
        /// The read end (1 or 2)
        read_index: u8,
    },

    /// The records of a pair contradict each other
    #[error("Inconsistent alignment pair for fragment '{fragment_id}': {reason}")]
    InconsistentPair {
        /// The fragment id
        fragment_id: String,
        /// Explanation of the inconsistency
        reason: String,
    },

    /// Invalid parameter value provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// The parameter name
        parameter: String,
        /// Explanation of why it's invalid
        reason: String,
    },

    /// File format error
    #[error("Invalid {file_type} file '{path}': {reason}")]
    InvalidFileFormat {
        /// Type of file (e.g., "chromosome id", "header")
        file_type: String,
        /// Path to the file
        path: String,
        /// Explanation of the problem
        reason: String,
    },

    /// Error opening a file through fgoxide
    #[error(transparent)]
    Fgoxide(#[from] fgoxide::FgError),

    /// Underlying I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FragmergeError {
    /// Builds a [`FragmergeError::MalformedLine`].
    pub fn malformed(
        source_name: &str,
        line_number: u64,
        line: &str,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedLine {
            source_name: source_name.to_string(),
            line_number,
            reason: reason.into(),
            line: line.to_string(),
        }
    }
}
