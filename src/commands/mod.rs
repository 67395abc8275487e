//! CLI command implementations for fragmerge.
//!
//! - [`reconcile`] - Merge transcript-projected and genome alignments per fragment

#![allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::struct_excessive_bools,
    clippy::uninlined_format_args
)]

pub mod command;
pub mod reconcile;
