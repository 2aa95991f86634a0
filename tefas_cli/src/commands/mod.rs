//! CLI subcommand implementations.

pub mod allocation;
pub mod funds;
pub mod history;
pub mod snapshot;
