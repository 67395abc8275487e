//! Command trait definition for CLI commands.
//!
//! The trait uses `enum_dispatch` to dispatch across the subcommand enum in `main.rs`.

use anyhow::Result;
use enum_dispatch::enum_dispatch;

/// Trait implemented by all fragmerge CLI commands.
///
/// The `command_line` parameter carries the full invocation for the output `@PG` record.
#[enum_dispatch]
pub trait Command {
    #[allow(clippy::missing_errors_doc)]
    fn execute(&self, command_line: &str) -> Result<()>;
}
