//! Subcommand implementations for the `pl` binary.

pub mod keys;
pub mod ledger;
pub mod serve;
