//! CLI subcommand implementations

pub mod generate;
pub mod refresh;
pub mod status;
