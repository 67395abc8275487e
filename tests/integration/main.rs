//! Integration tests for the fragmerge binary.
//!
//! These tests run the CLI end to end on small text fixtures.

mod helpers;
mod test_error_paths;
mod test_reconcile_command;
