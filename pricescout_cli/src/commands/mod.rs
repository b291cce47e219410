//! CLI subcommand implementations.

pub mod bulk;
pub mod history;
pub mod search;
