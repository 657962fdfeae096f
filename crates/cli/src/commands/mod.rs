//! Subcommand implementations.

pub mod artifact;
pub mod ask;
pub mod config_cmd;
pub mod estimate;
pub mod status;
