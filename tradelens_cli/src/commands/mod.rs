//! CLI subcommand implementations.

pub mod chart;
pub mod datasets;
pub mod export;
pub mod query;
pub mod search;
